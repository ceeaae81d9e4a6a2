use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Prefix of every handle issued by [`BlobRegistry`].
pub const BLOB_SCHEME: &str = "blob:";

/// Releases resource handles held by a cache.
pub trait HandleRevoker: Send + Sync {
    /// Whether `handle` refers to something that must be released.
    fn is_revocable(&self, handle: &str) -> bool;

    /// Release `handle`. Unknown handles are ignored.
    fn revoke(&self, handle: &str);
}

/// Registry that turns downloaded bytes into opaque `blob:` handles.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize `data` and return a fresh handle for it.
    pub fn register(&self, data: Bytes) -> String {
        let handle = format!("{BLOB_SCHEME}backoffice/{}", Uuid::new_v4());
        debug!(handle = %handle, size = data.len(), "Registered blob");
        self.blobs.lock().insert(handle.clone(), data);
        handle
    }

    /// Bytes behind a live handle.
    pub fn resolve(&self, handle: &str) -> Option<Bytes> {
        self.blobs.lock().get(handle).cloned()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl HandleRevoker for BlobRegistry {
    fn is_revocable(&self, handle: &str) -> bool {
        handle.starts_with(BLOB_SCHEME)
    }

    fn revoke(&self, handle: &str) {
        if self.blobs.lock().remove(handle).is_some() {
            debug!(handle = %handle, "Revoked blob");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let registry = BlobRegistry::new();
        let handle = registry.register(Bytes::from_static(b"avatar"));

        assert!(handle.starts_with("blob:backoffice/"));
        assert_eq!(registry.resolve(&handle), Some(Bytes::from_static(b"avatar")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn revoke_releases_bytes() {
        let registry = BlobRegistry::new();
        let handle = registry.register(Bytes::from_static(b"avatar"));

        registry.revoke(&handle);
        registry.revoke(&handle);

        assert!(registry.resolve(&handle).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn only_blob_handles_are_revocable() {
        let registry = BlobRegistry::new();

        assert!(registry.is_revocable("blob:backoffice/1234"));
        assert!(!registry.is_revocable("https://cdn.example.com/a.png"));
    }
}
