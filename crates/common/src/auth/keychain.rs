//! Platform keychain backend for session slots
//!
//! Wraps `keyring` (macOS Keychain Access, Windows Credential Manager, Linux
//! kernel keyutils). Each slot becomes one keychain entry under the configured
//! service name. Targets without a native store fall back to keyring's mock
//! credentials, which keep nothing between entries.

use keyring::Entry;
use tracing::debug;

use super::storage::{SessionStorage, StorageError};

/// Keychain-backed [`SessionStorage`].
pub struct KeychainStorage {
    service_name: String,
}

impl KeychainStorage {
    /// Create a keychain storage for a specific service
    ///
    /// # Arguments
    /// * `service_name` - Service identifier (e.g., "Backoffice.session")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            StorageError::AccessFailed(format!("Failed to open keychain entry {key}: {e}"))
        })
    }
}

impl SessionStorage for KeychainStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!(service = %self.service_name, key = %key, "Reading session slot from keychain");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::AccessFailed(format!("Failed to read {key}: {e}"))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, key = %key, "Writing session slot to keychain");

        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::AccessFailed(format!("Failed to write {key}: {e}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, key = %key, "Removing session slot from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::AccessFailed(format!("Failed to remove {key}: {e}"))),
        }
    }
}
