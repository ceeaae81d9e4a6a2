//! Avatar loading backed by the resource cache

use std::sync::Arc;
use std::time::Duration;

use backoffice_common::cache::{BlobRegistry, ResourceCache};
use backoffice_common::resilience::{Clock, SystemClock};
use bytes::Bytes;
use tracing::debug;

use super::client::ApiClient;
use super::errors::ApiError;

/// Path of a user's avatar image.
pub fn avatar_path(user_id: u64) -> String {
    format!("/users/{user_id}/avatar")
}

/// Downloads avatars once per TTL and hands out `blob:` handles for them.
///
/// Handles replaced or expired in the cache are revoked from the registry.
pub struct AvatarLoader<C = SystemClock>
where
    C: Clock,
{
    client: Arc<ApiClient>,
    registry: Arc<BlobRegistry>,
    cache: ResourceCache<C>,
}

impl AvatarLoader<SystemClock> {
    pub fn new(client: Arc<ApiClient>, ttl: Duration) -> Self {
        Self::with_clock(client, ttl, SystemClock)
    }
}

impl<C> AvatarLoader<C>
where
    C: Clock,
{
    pub fn with_clock(client: Arc<ApiClient>, ttl: Duration, clock: C) -> Self {
        let registry = Arc::new(BlobRegistry::new());
        let cache = ResourceCache::with_clock(ttl, registry.clone(), clock);
        Self { client, registry, cache }
    }

    /// Handle for `user_id`'s avatar, downloading it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns the API error of the download; failures are not cached.
    pub async fn load(&self, user_id: u64) -> Result<String, ApiError> {
        if let Some(handle) = self.cache.get(user_id) {
            return Ok(handle);
        }

        let bytes = self.client.get_bytes(&avatar_path(user_id)).await?;
        // concurrent loads share the download; only the first to land registers
        let handle = self.cache.get_or_set_with(user_id, || {
            let handle = self.registry.register(bytes.clone());
            (handle, Some(bytes))
        });

        debug!(user_id, handle = %handle, "Avatar cached");
        Ok(handle)
    }

    /// Bytes behind a handle returned by [`load`](Self::load).
    pub fn resolve(&self, handle: &str) -> Option<Bytes> {
        self.registry.resolve(handle)
    }

    /// Forget `user_id`'s avatar, e.g. after it was re-uploaded.
    pub fn invalidate(&self, user_id: u64) -> bool {
        self.cache.delete(user_id)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &ResourceCache<C> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<BlobRegistry> {
        &self.registry
    }
}
