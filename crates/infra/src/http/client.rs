use std::time::Duration;

use backoffice_domain::constants::{MAX_RETRIES, PRODUCTION_TIMEOUT_SECS, RETRY_BASE_DELAY_MS};
use backoffice_domain::BackofficeError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client with connectivity retries and a request timeout.
///
/// Only failures where no response arrived are retried; any HTTP status,
/// including 5xx, is handed back to the caller untouched.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_retries: u32,
    base_backoff: Duration,
    retries_enabled: bool,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackofficeError::Config`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, BackofficeError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Retry `n` waits `n * base_backoff` before re-issuing the same request.
    /// The counter lives for this call only, so every request starts with a
    /// full budget.
    ///
    /// # Errors
    ///
    /// Returns [`BackofficeError::Internal`] when the request body cannot be
    /// cloned for a retry, and the converted transport error once the retry
    /// budget is spent or the failure is not retryable.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, BackofficeError> {
        let mut retries: u32 = 0;

        loop {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                BackofficeError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                BackofficeError::from(infra)
            })?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = retries + 1, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = retries + 1, %method, %url, %status, "received HTTP response");
                    if retries > 0 {
                        debug!(%method, %url, retries, "request recovered, retry counter reset");
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if self.should_retry(retries, &err) {
                        retries += 1;
                        warn!(retry = retries, %method, %url, error = %err, "no response, retrying");
                        self.sleep_with_backoff(retries).await;
                        continue;
                    }

                    debug!(attempt = retries + 1, %method, %url, error = %err, "HTTP request failed");
                    let infra: InfraError = err.into();
                    return Err(BackofficeError::from(infra));
                }
            }
        }
    }

    fn should_retry(&self, retries: u32, err: &reqwest::Error) -> bool {
        self.retries_enabled && retries < self.max_retries && is_connectivity_error(err)
    }

    fn backoff_delay(&self, retry_number: u32) -> Duration {
        self.base_backoff.saturating_mul(retry_number)
    }

    async fn sleep_with_backoff(&self, retry_number: u32) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
    retries_enabled: bool,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(PRODUCTION_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            base_backoff: Duration::from_millis(RETRY_BASE_DELAY_MS),
            retries_enabled: true,
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure how many times a request is re-issued after the first try.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn retries_enabled(mut self, enabled: bool) -> Self {
        self.retries_enabled = enabled;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`BackofficeError::Config`] if the TLS backend cannot be
    /// initialized.
    pub fn build(self) -> Result<HttpClient, BackofficeError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            BackofficeError::from(infra)
        })?;

        Ok(HttpClient {
            client,
            max_retries: self.max_retries,
            base_backoff: self.base_backoff,
            retries_enabled: self.retries_enabled,
        })
    }
}

/// Failures where the server never produced a response.
fn is_connectivity_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .max_retries(3)
            .build()
            .expect("http client")
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_on_network_failure_with_linear_backoff() {
        let url = closed_port_url();
        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(20))
            .max_retries(2)
            .build()
            .expect("http client");

        let started = Instant::now();
        let result = client.send(client.request(Method::GET, &url)).await;

        // 20ms + 40ms of backoff before giving up
        assert!(started.elapsed() >= Duration::from_millis(60));
        match result {
            Err(BackofficeError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn disabled_retries_fail_immediately() {
        let url = closed_port_url();
        let client = HttpClient::builder()
            .base_backoff(Duration::from_secs(5))
            .retries_enabled(false)
            .build()
            .expect("http client");

        let started = Instant::now();
        let result = client.send(client.request(Method::GET, &url)).await;

        assert!(matches!(result, Err(BackofficeError::Network(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn backoff_is_linear() {
        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(1_000))
            .build()
            .expect("http client");

        assert_eq!(client.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(client.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(3));
    }
}
