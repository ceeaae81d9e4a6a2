//! Error classification
//!
//! Maps a [`RawFailure`] onto the closed [`ErrorKind`] taxonomy. Pure: session
//! teardown on 401 is performed by the API client, not here.

use backoffice_domain::{Environment, NormalizedError};
use serde_json::Value;

use super::errors::RawFailure;

pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";
pub const INVALID_DATA_MESSAGE: &str = "Invalid data submitted.";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Please sign in again.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Internal server error. Please try again later.";
pub const UNKNOWN_MESSAGE: &str = "An unknown error occurred.";

/// Classify a failed request. First match wins.
///
/// In development, 500 responses keep the server payload as `details` and
/// append its message for diagnosis.
pub fn classify(raw: &RawFailure, environment: Environment) -> NormalizedError {
    let (status, body) = match raw {
        RawFailure::NoResponse { .. } => return NormalizedError::new(0, CONNECTIVITY_MESSAGE),
        RawFailure::Status { status, body } => (*status, body.as_ref()),
    };

    match status {
        400 => NormalizedError::new(400, payload_message(body).unwrap_or(INVALID_DATA_MESSAGE))
            .with_details(body.cloned()),
        401 => NormalizedError::new(401, UNAUTHORIZED_MESSAGE),
        403 => NormalizedError::new(403, FORBIDDEN_MESSAGE),
        404 => NormalizedError::new(404, NOT_FOUND_MESSAGE),
        500 if environment.is_development() => {
            let message = match payload_message(body) {
                Some(detail) => format!("{SERVER_ERROR_MESSAGE} ({detail})"),
                None => SERVER_ERROR_MESSAGE.to_string(),
            };
            NormalizedError::new(500, message).with_details(body.cloned())
        }
        500 => NormalizedError::new(500, SERVER_ERROR_MESSAGE),
        other => NormalizedError::new(other, payload_message(body).unwrap_or(UNKNOWN_MESSAGE))
            .with_details(body.cloned()),
    }
}

/// Human-readable message carried by an error payload.
///
/// Accepts a bare JSON string or an object with `message`, `detail` or
/// `error`.
fn payload_message(body: Option<&Value>) -> Option<&str> {
    let message = match body? {
        Value::String(text) => Some(text.as_str()),
        Value::Object(fields) => ["message", "detail", "error"]
            .iter()
            .find_map(|field| fields.get(*field).and_then(Value::as_str)),
        _ => None,
    }?;

    let message = message.trim();
    (!message.is_empty()).then_some(message)
}
