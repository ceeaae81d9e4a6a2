//! User-facing error descriptor produced from transport failures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Closed taxonomy of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received (status 0)
    Connectivity,
    /// 400
    Validation,
    /// 401, always ends the session
    Auth,
    /// 403
    Permission,
    /// 404
    NotFound,
    /// 500
    Server,
    /// Any other status
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status onto the taxonomy. Status `0` means no response.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Connectivity,
            400 => Self::Validation,
            401 => Self::Auth,
            403 => Self::Permission,
            404 => Self::NotFound,
            500 => Self::Server,
            _ => Self::Unknown,
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }
}

/// Error shape handed to calling code, which renders `message` directly.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl NormalizedError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::from_status(status), message: message.into(), status, details: None }
    }

    /// Override the kind derived from the status, for failures that never
    /// reached the server but are not connectivity problems.
    #[must_use]
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn is_connectivity(&self) -> bool {
        self.kind == ErrorKind::Connectivity
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind == ErrorKind::Auth
    }
}
