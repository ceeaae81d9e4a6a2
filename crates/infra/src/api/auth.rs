//! Session lifecycle over the API client
//!
//! Signs users in and out. A successful login or registration stores the
//! issued token and profile in the [`TokenStore`] the client reads from, so
//! subsequent requests carry the new credential.

use std::sync::Arc;

use backoffice_common::auth::TokenStore;
use backoffice_domain::constants::{AUTH_LOGIN_ENDPOINT, AUTH_ME_ENDPOINT, AUTH_REGISTER_ENDPOINT};
use backoffice_domain::{Session, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::ApiClient;
use super::errors::ApiError;

/// Login payload
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

/// Registration payload
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body returned by the login and registration endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.token, response.user)
    }
}

/// Login, registration and logout against the back-office API.
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn tokens(&self) -> &Arc<TokenStore> {
        self.client.token_store()
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns the classified API error (400 for bad credentials) or a
    /// storage error if the session cannot be persisted
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        debug!(email = %credentials.email, "Signing in");
        let response: AuthResponse = self.client.post(AUTH_LOGIN_ENDPOINT, credentials).await?;
        self.establish(response)
    }

    /// Create an account and persist the session it returns.
    ///
    /// # Errors
    ///
    /// Returns the classified API error (400 for an invalid registration) or a
    /// storage error if the session cannot be persisted
    pub async fn register(&self, registration: &Registration) -> Result<Session, ApiError> {
        debug!(email = %registration.email, "Registering account");
        let response: AuthResponse =
            self.client.post(AUTH_REGISTER_ENDPOINT, registration).await?;
        self.establish(response)
    }

    /// Refresh the cached profile from `GET /auth/me`.
    ///
    /// # Errors
    ///
    /// Returns the API error of the request or a storage error if the profile
    /// cannot be cached
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.client.get(AUTH_ME_ENDPOINT).await?;
        self.tokens().set_user_profile(&profile)?;
        Ok(profile)
    }

    /// Drop the local session. Idempotent; no server call is made.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a session slot cannot be removed
    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens().clear_auth()?;
        info!("Signed out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_authenticated()
    }

    fn establish(&self, response: AuthResponse) -> Result<Session, ApiError> {
        let session = Session::from(response);
        self.tokens().set_session(&session)?;
        info!(user_id = ?session.user_profile.id(), "Session established");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use backoffice_common::auth::MemoryStorage;
    use backoffice_domain::{ApiConfig, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(base_url: String) -> AuthService {
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        let config = ApiConfig { upgrade_insecure: false, ..ApiConfig::new(base_url) };
        AuthService::new(Arc::new(ApiClient::new(config, tokens).unwrap()))
    }

    #[tokio::test]
    async fn login_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "ana@example.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-123",
                "user": {"id": 42, "name": "Ana"}
            })))
            .mount(&server)
            .await;

        let auth = service(server.uri());
        let session = auth.login(&Credentials::new("ana@example.com", "secret")).await.unwrap();

        assert_eq!(session.token, "t-123");
        assert!(auth.is_authenticated());
        assert_eq!(auth.tokens().get_token().unwrap().as_deref(), Some("t-123"));
        assert_eq!(auth.tokens().session().unwrap(), Some(session));
    }

    #[tokio::test]
    async fn rejected_login_leaves_store_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let auth = service(server.uri());
        let err = auth.login(&Credentials::new("ana@example.com", "wrong")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.normalized().message, "Invalid credentials");
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn current_user_uses_token_and_refreshes_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer t-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "Bea"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = service(server.uri());
        auth.tokens().set_token("t-1").unwrap();

        let profile = auth.current_user().await.unwrap();
        assert_eq!(profile.name(), Some("Bea"));
        assert_eq!(auth.tokens().user_profile().unwrap(), Some(profile));
    }

    #[test]
    fn logout_is_idempotent() {
        let auth = service("http://127.0.0.1:9".into());
        auth.tokens().set_token("t-1").unwrap();

        auth.logout().unwrap();
        auth.logout().unwrap();
        assert!(!auth.is_authenticated());
    }
}
