//! Short-lived cache of locally materialized binary resources
//!
//! Asset call sites (avatars and similar per-owner images) download bytes
//! once, register them with a [`BlobRegistry`] to obtain an opaque handle, and
//! keep that handle in a [`ResourceCache`] for a freshness window.
//!
//! # Handle lifecycle
//!
//! Every revocable handle stored in the cache is revoked exactly once: when it
//! is overwritten by `set`, removed by `delete`/`clear`, or evicted after its
//! TTL. Handles still cached when the process exits are simply dropped.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use backoffice_common::cache::{BlobRegistry, ResourceCache};
//!
//! let blobs = Arc::new(BlobRegistry::new());
//! let cache = ResourceCache::new(Duration::from_secs(300), blobs.clone());
//!
//! let handle = blobs.register(vec![0x89, 0x50, 0x4e, 0x47].into());
//! cache.set(42, handle.clone(), None);
//! assert_eq!(cache.get(42), Some(handle));
//! ```

mod blob;
mod resource;

pub use blob::{BlobRegistry, HandleRevoker, BLOB_SCHEME};
pub use resource::ResourceCache;
