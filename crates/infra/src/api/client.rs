//! API client with request deduplication, retries and session teardown
//!
//! Every verb is routed through a [`RequestDeduplicator`] keyed on method,
//! path and body. Each physical request resolves its URL against the
//! configured base, attaches the bearer token when one is stored and goes
//! through [`HttpClient`] for connectivity retries.

use std::sync::Arc;
use std::time::Duration;

use backoffice_common::auth::TokenStore;
use backoffice_domain::constants::{HEALTH_CHECK_TIMEOUT_SECS, HEALTH_ENDPOINT};
use backoffice_domain::{ApiConfig, BackofficeError};
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::classifier::classify;
use super::dedup::RequestDeduplicator;
use super::endpoint::{resolve_url, upgrade_insecure};
use super::errors::{ApiError, RawFailure};
use super::reauth::{ReauthEvent, ReauthHandler, ReauthSignal};
use crate::http::HttpClient;

/// Performs one logical request end to end. Shared with in-flight futures.
struct Dispatcher {
    http: HttpClient,
    config: ApiConfig,
    tokens: Arc<TokenStore>,
    reauth: Arc<dyn ReauthHandler>,
}

impl Dispatcher {
    fn url_for(&self, path: &str) -> String {
        let url = resolve_url(&self.config.base_url, path);
        if self.config.upgrade_insecure {
            upgrade_insecure(&url)
        } else {
            url
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Bytes, ApiError> {
        let url = self.url_for(path);
        let mut request = self.http.request(method.clone(), &url).header(ACCEPT, "application/json");

        if let Some(token) = self.tokens.get_token()?.filter(|token| !token.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(BackofficeError::Network(message)) => {
                let raw = RawFailure::NoResponse { message };
                warn!(%method, path, error = %raw, "Request failed without a response");
                return Err(ApiError::Request(classify(&raw, self.config.environment)));
            }
            Err(other) => return Err(other.into()),
        };

        let status = response.status();
        if status.is_success() {
            debug!(%method, path, %status, "Request succeeded");
            return read_body(response).await;
        }

        let raw = RawFailure::Status { status: status.as_u16(), body: error_payload(response).await };

        if status.as_u16() == 401 {
            self.end_session(path)?;
            return Err(ApiError::SessionExpired(raw));
        }

        let normalized = classify(&raw, self.config.environment);
        warn!(%method, path, status = raw.status(), kind = normalized.kind.label(), "Request rejected");
        Err(ApiError::Request(normalized))
    }

    /// Clear credentials and ask the host application to sign in again.
    ///
    /// A failed clear is attempted once more. If it still fails the storage
    /// error is returned, since the token may remain stored.
    fn end_session(&self, path: &str) -> Result<(), ApiError> {
        let cleared = self.tokens.clear_auth().or_else(|first| {
            warn!(error = %first, "Failed to clear session after 401, retrying");
            self.tokens.clear_auth()
        });
        self.reauth.force_reauthentication(ReauthEvent::new(path, self.config.login_path.clone()));

        cleared.map_err(|e| {
            error!(error = %e, "Session still stored after 401");
            ApiError::from(e)
        })
    }
}

async fn read_body(response: Response) -> Result<Bytes, ApiError> {
    response.bytes().await.map_err(|err| ApiError::Decode(format!("Failed to read body: {err}")))
}

/// Error body as JSON when possible, else as a plain string.
async fn error_payload(response: Response) -> Option<Value> {
    let text = response.text().await.ok()?;
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Decode a success body. Empty bodies (204) decode from `null`.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("Failed to serialize body: {e}")))
}

/// Transport client for the back-office API.
pub struct ApiClient {
    dispatcher: Arc<Dispatcher>,
    dedup: RequestDeduplicator<Bytes, ApiError>,
}

impl ApiClient {
    /// Create a client with the default re-authentication signal.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: ApiConfig, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        Self::builder().config(config).token_store(tokens).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.dispatcher.config
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.dispatcher.tokens
    }

    /// GET `path` and decode the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SessionExpired`] on 401, a classified
    /// [`ApiError::Request`] for other failures and [`ApiError::Decode`] when
    /// the body does not match `T`.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let bytes = self.execute(Method::GET, path, None).await?;
        decode(&bytes)
    }

    /// # Errors
    ///
    /// As for [`get`](Self::get), plus [`ApiError::Decode`] if `body` cannot be
    /// serialized.
    #[instrument(skip(self, body))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.execute(Method::POST, path, Some(encode(body)?)).await?;
        decode(&bytes)
    }

    /// # Errors
    ///
    /// As for [`get`](Self::get), plus [`ApiError::Decode`] if `body` cannot be
    /// serialized.
    #[instrument(skip(self, body))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.execute(Method::PUT, path, Some(encode(body)?)).await?;
        decode(&bytes)
    }

    /// # Errors
    ///
    /// As for [`get`](Self::get), plus [`ApiError::Decode`] if `body` cannot be
    /// serialized.
    #[instrument(skip(self, body))]
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.execute(Method::PATCH, path, Some(encode(body)?)).await?;
        decode(&bytes)
    }

    /// # Errors
    ///
    /// As for [`get`](Self::get).
    #[instrument(skip(self))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let bytes = self.execute(Method::DELETE, path, None).await?;
        decode(&bytes)
    }

    /// GET returning the raw body, for binary assets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SessionExpired`] on 401 and a classified
    /// [`ApiError::Request`] for other failures.
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    /// Probe `GET /health` with a short timeout.
    ///
    /// Bypasses deduplication and session handling. Any answer other than a
    /// success status reports unhealthy; only a missing response is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] with a connectivity kind when no response
    /// arrives.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let url = self.dispatcher.url_for(HEALTH_ENDPOINT);
        let request = self
            .dispatcher
            .http
            .request(Method::GET, &url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS));

        match self.dispatcher.http.send(request).await {
            Ok(response) => {
                let healthy = response.status().is_success();
                info!(status = %response.status(), healthy, "Health check completed");
                Ok(healthy)
            }
            Err(BackofficeError::Network(message)) => {
                let raw = RawFailure::NoResponse { message };
                Err(ApiError::Request(classify(&raw, self.dispatcher.config.environment)))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Bytes, ApiError> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let request_method = method.clone();
        let request_path = path.to_string();
        let request_body = body.clone();

        self.dedup
            .execute_unique(&method, path, body.as_ref(), move || async move {
                dispatcher.dispatch(request_method, &request_path, request_body.as_ref()).await
            })
            .await
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    tokens: Option<Arc<TokenStore>>,
    reauth: Option<Arc<dyn ReauthHandler>>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn token_store(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the handler notified on every 401
    pub fn reauth_handler(mut self, handler: Arc<dyn ReauthHandler>) -> Self {
        self.reauth = Some(handler);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if the token store is missing or the HTTP client cannot
    /// be created
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let tokens =
            self.tokens.ok_or_else(|| ApiError::Config("Token store not set".to_string()))?;
        let reauth = self.reauth.unwrap_or_else(|| Arc::new(ReauthSignal::new()));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("backoffice-api/{}", env!("CARGO_PKG_VERSION")));

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .max_retries(config.retry.max_retries)
            .base_backoff(config.retry.base_delay())
            .retries_enabled(config.retries_enabled())
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        debug!(
            base_url = %config.base_url,
            environment = %config.environment,
            timeout_secs = config.timeout().as_secs(),
            "API client configured"
        );

        let dedup = RequestDeduplicator::new(config.dedup_ttl());
        Ok(ApiClient { dispatcher: Arc::new(Dispatcher { http, config, tokens, reauth }), dedup })
    }
}
