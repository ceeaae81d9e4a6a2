//! API-specific error types
//!
//! Separates the raw transport outcome ([`RawFailure`]) from what the client
//! hands back to callers ([`ApiError`]). Every `ApiError` can be rendered as a
//! [`NormalizedError`].

use std::fmt;

use backoffice_common::auth::StorageError;
use backoffice_domain::{BackofficeError, Environment, ErrorKind, NormalizedError};
use serde_json::Value;
use thiserror::Error;

use super::classifier::classify;

/// Unprocessed failure of one physical request.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The server never answered (refused, reset, timed out)
    NoResponse { message: String },
    /// The server answered with a non-success status
    Status { status: u16, body: Option<Value> },
}

impl RawFailure {
    /// HTTP status, `0` when no response arrived.
    pub fn status(&self) -> u16 {
        match self {
            Self::NoResponse { .. } => 0,
            Self::Status { status, .. } => *status,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::NoResponse { .. } => None,
            Self::Status { body, .. } => body.as_ref(),
        }
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse { message } => write!(f, "no response: {message}"),
            Self::Status { status, .. } => write!(f, "HTTP {status}"),
        }
    }
}

/// API operation errors
///
/// `Clone` because deduplicated callers all receive the same outcome.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Terminal 401: the session has been cleared and re-authentication
    /// forced. Carries the raw failure unclassified.
    #[error("Session expired: {0}")]
    SessionExpired(RawFailure),

    /// Classified request failure
    #[error("{0}")]
    Request(NormalizedError),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionExpired(_) => ErrorKind::Auth,
            Self::Request(normalized) => normalized.kind,
            Self::Decode(_) | Self::Config(_) | Self::Storage(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status behind this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired(raw) => Some(raw.status()),
            Self::Request(normalized) if normalized.status != 0 => Some(normalized.status),
            _ => None,
        }
    }

    /// Shape calling code renders.
    pub fn normalized(&self) -> NormalizedError {
        match self {
            Self::SessionExpired(raw) => classify(raw, Environment::Production),
            Self::Request(normalized) => normalized.clone(),
            Self::Decode(_) => NormalizedError::new(0, "Unexpected response from the server.")
                .with_kind(ErrorKind::Unknown),
            Self::Config(_) | Self::Storage(_) => {
                NormalizedError::new(0, "An unknown error occurred.").with_kind(ErrorKind::Unknown)
            }
        }
    }
}

impl From<NormalizedError> for ApiError {
    fn from(err: NormalizedError) -> Self {
        Self::Request(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<BackofficeError> for ApiError {
    fn from(err: BackofficeError) -> Self {
        match err {
            BackofficeError::Network(message) => {
                Self::Request(classify(&RawFailure::NoResponse { message }, Environment::Production))
            }
            BackofficeError::Storage(message) => Self::Storage(message),
            BackofficeError::InvalidInput(message) => Self::Decode(message),
            other => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_failure_status() {
        assert_eq!(RawFailure::NoResponse { message: "refused".into() }.status(), 0);

        let raw = RawFailure::Status { status: 422, body: Some(json!({"message": "bad"})) };
        assert_eq!(raw.status(), 422);
        assert_eq!(raw.body(), Some(&json!({"message": "bad"})));
        assert_eq!(raw.to_string(), "HTTP 422");
    }

    #[test]
    fn session_expired_normalizes_as_auth() {
        let err = ApiError::SessionExpired(RawFailure::Status { status: 401, body: None });

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.normalized().status, 401);
        assert!(err.normalized().is_auth_failure());
    }

    #[test]
    fn connectivity_has_no_status() {
        let err: ApiError = BackofficeError::Network("refused".into()).into();

        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(err.status(), None);
        assert_eq!(err.normalized().status, 0);
    }

    #[test]
    fn local_failures_render_as_unknown() {
        let err = ApiError::Decode("expected value".into());
        let normalized = err.normalized();

        assert_eq!(normalized.kind, ErrorKind::Unknown);
        assert_eq!(normalized.status, 0);

        let storage: ApiError = StorageError::AccessFailed("locked".into()).into();
        assert_eq!(storage.kind(), ErrorKind::Unknown);
    }
}
