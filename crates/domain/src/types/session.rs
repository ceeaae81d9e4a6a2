//! Authenticated session types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cached profile of the signed-in user.
///
/// The backend owns the schema, so the profile is kept as an open JSON object
/// and only a few well-known fields get typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look up a raw profile field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Numeric user id, when the backend supplies one.
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Bearer credential plus the profile it was issued for.
///
/// Both halves are persisted and cleared together by the token store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(rename = "user")]
    pub user_profile: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, user_profile: UserProfile) -> Self {
        Self { token: token.into(), user_profile }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn profile_accessors_read_well_known_fields() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": 42, "name": "Ana", "email": "ana@example.com"}))
                .unwrap();

        assert_eq!(profile.id(), Some(42));
        assert_eq!(profile.name(), Some("Ana"));
        assert_eq!(profile.email(), Some("ana@example.com"));
        assert!(profile.get("role").is_none());
    }

    #[test]
    fn session_deserializes_login_payload() {
        let session: Session =
            serde_json::from_value(json!({"token": "abc", "user": {"id": 7}})).unwrap();

        assert_eq!(session.token, "abc");
        assert_eq!(session.user_profile.id(), Some(7));
    }
}
