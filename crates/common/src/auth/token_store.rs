//! Bearer token and cached user profile

use std::sync::Arc;

use backoffice_domain::constants::{PROFILE_STORAGE_KEY, TOKEN_STORAGE_KEY};
use backoffice_domain::{Session, SessionConfig, UserProfile};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::storage::{SessionStorage, StorageError};

/// Holder of the session credential, written through to durable storage.
///
/// Reads go straight to storage. Writes that touch both slots and
/// [`TokenStore::clear_auth`] run under one lock so concurrent callers never
/// observe a half-written or half-cleared pair.
pub struct TokenStore {
    storage: Arc<dyn SessionStorage>,
    token_key: String,
    profile_key: String,
    write_lock: Mutex<()>,
}

impl TokenStore {
    /// Create a store using the default slot names.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_keys(storage, TOKEN_STORAGE_KEY, PROFILE_STORAGE_KEY)
    }

    pub fn with_keys(
        storage: Arc<dyn SessionStorage>,
        token_key: impl Into<String>,
        profile_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            token_key: token_key.into(),
            profile_key: profile_key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(storage: Arc<dyn SessionStorage>, config: &SessionConfig) -> Self {
        Self::with_keys(storage, config.token_key.clone(), config.profile_key.clone())
    }

    /// Read the bearer token. No side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AccessFailed`] if the backend cannot be read.
    pub fn get_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get_item(&self.token_key)
    }

    /// Store the bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AccessFailed`] if the backend rejects the write.
    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.storage.set_item(&self.token_key, token)
    }

    /// Cache the signed-in user's profile as JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error or a backend write failure.
    pub fn set_user_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(profile)?;
        let _guard = self.write_lock.lock();
        self.storage.set_item(&self.profile_key, &serialized)
    }

    /// Read back the cached profile.
    ///
    /// # Errors
    ///
    /// Returns a backend read failure or a serialization error for a corrupt
    /// profile slot.
    pub fn user_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        match self.storage.get_item(&self.profile_key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persist a freshly issued session: token first, then its profile.
    ///
    /// # Errors
    ///
    /// Returns the first serialization or backend write failure.
    pub fn set_session(&self, session: &Session) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&session.user_profile)?;
        let _guard = self.write_lock.lock();

        self.storage.set_item(&self.token_key, &session.token)?;
        self.storage.set_item(&self.profile_key, &serialized)?;

        debug!("Session stored");
        Ok(())
    }

    /// Current session, if both token and profile are present.
    ///
    /// # Errors
    ///
    /// Returns a backend read failure or a corrupt profile error.
    pub fn session(&self) -> Result<Option<Session>, StorageError> {
        let Some(token) = self.get_token()? else {
            return Ok(None);
        };
        Ok(self.user_profile()?.map(|profile| Session::new(token, profile)))
    }

    /// Remove both slots. Idempotent.
    ///
    /// # Errors
    ///
    /// Both removals are attempted even if the first fails; the first error is
    /// returned.
    pub fn clear_auth(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        let token_result = self.storage.remove_item(&self.token_key);
        let profile_result = self.storage.remove_item(&self.profile_key);

        debug!("Session cleared");
        token_result.and(profile_result)
    }

    /// True iff a non-empty token is present.
    pub fn is_authenticated(&self) -> bool {
        match self.get_token() {
            Ok(token) => token.is_some_and(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                false
            }
        }
    }
}
