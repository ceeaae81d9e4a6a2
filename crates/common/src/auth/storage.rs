//! Durable key-value slots backing the token store

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

/// Session storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend access failed (permission denied, not available, etc.)
    #[error("Storage access failed: {0}")]
    AccessFailed(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable string slots, in the spirit of browser `localStorage`.
///
/// Implementations must make `remove_item` idempotent: removing a missing key
/// is not an error.
pub trait SessionStorage: Send + Sync {
    /// Read a slot. A missing slot is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AccessFailed`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError::AccessFailed`] if the backend rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError::AccessFailed`] if the slot exists but cannot be
    /// removed.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and sessions that should not outlive the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.slots.lock().remove(key);
        Ok(())
    }
}
