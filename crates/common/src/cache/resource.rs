use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use super::blob::HandleRevoker;
use crate::resilience::{Clock, SystemClock};

/// Entry stored per owner
#[derive(Debug, Clone)]
struct ResourceEntry {
    handle: String,
    created_at: Instant,
    raw_data: Option<Bytes>,
}

/// Time-boxed cache of one resource handle per owner (e.g. one avatar per
/// user).
///
/// Purely a lookup structure: it never fetches anything. Stale entries are
/// evicted lazily by [`get`](Self::get) and [`has`](Self::has).
///
/// # Type Parameters
/// - `C`: Clock type for time-based operations (defaults to `SystemClock`)
pub struct ResourceCache<C = SystemClock>
where
    C: Clock,
{
    entries: Mutex<HashMap<u64, ResourceEntry>>,
    ttl: Duration,
    revoker: Arc<dyn HandleRevoker>,
    clock: C,
}

impl ResourceCache<SystemClock> {
    pub fn new(ttl: Duration, revoker: Arc<dyn HandleRevoker>) -> Self {
        Self::with_clock(ttl, revoker, SystemClock)
    }
}

impl<C> ResourceCache<C>
where
    C: Clock,
{
    /// Create a cache with a custom clock (useful for testing)
    pub fn with_clock(ttl: Duration, revoker: Arc<dyn HandleRevoker>, clock: C) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, revoker, clock }
    }

    /// Store `handle` for `owner_id`, revoking any handle it replaces.
    pub fn set(&self, owner_id: u64, handle: impl Into<String>, raw_data: Option<Bytes>) {
        let entry = ResourceEntry { handle: handle.into(), created_at: self.clock.now(), raw_data };

        let mut entries = self.entries.lock();
        if let Some(previous) = entries.remove(&owner_id) {
            if previous.handle != entry.handle {
                self.release(owner_id, &previous.handle);
            }
        }
        entries.insert(owner_id, entry);
    }

    /// Fresh handle for `owner_id`, or the one built by `make` on a miss.
    ///
    /// Lookup and insert share one lock, so callers racing on the same owner
    /// all get the handle that ends up stored and `make` runs once per miss.
    pub fn get_or_set_with<F>(&self, owner_id: u64, make: F) -> String
    where
        F: FnOnce() -> (String, Option<Bytes>),
    {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(&owner_id) {
            if now.saturating_duration_since(entry.created_at) <= self.ttl {
                return entry.handle.clone();
            }
        }

        let (handle, raw_data) = make();
        let entry = ResourceEntry { handle: handle.clone(), created_at: now, raw_data };
        if let Some(previous) = entries.insert(owner_id, entry) {
            if previous.handle != handle {
                self.release(owner_id, &previous.handle);
            }
        }
        handle
    }

    /// Fresh handle for `owner_id`, evicting it when stale.
    pub fn get(&self, owner_id: u64) -> Option<String> {
        self.fresh_entry(owner_id).map(|entry| entry.handle)
    }

    /// Raw bytes stored alongside a fresh handle.
    pub fn get_raw(&self, owner_id: u64) -> Option<Bytes> {
        self.fresh_entry(owner_id).and_then(|entry| entry.raw_data)
    }

    /// Freshness-aware existence check; evicts stale entries like `get`.
    pub fn has(&self, owner_id: u64) -> bool {
        self.fresh_entry(owner_id).is_some()
    }

    /// Revoke and drop the entry for `owner_id`. Returns whether one existed.
    pub fn delete(&self, owner_id: u64) -> bool {
        let removed = self.entries.lock().remove(&owner_id);
        match removed {
            Some(entry) => {
                self.release(owner_id, &entry.handle);
                true
            }
            None => false,
        }
    }

    /// Revoke and drop every entry.
    pub fn clear(&self) {
        let drained: Vec<(u64, ResourceEntry)> = self.entries.lock().drain().collect();
        for (owner_id, entry) in &drained {
            self.release(*owner_id, &entry.handle);
        }
        debug!(count = drained.len(), "Resource cache cleared");
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fresh_entry(&self, owner_id: u64) -> Option<ResourceEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.get(&owner_id)?;
        if now.saturating_duration_since(entry.created_at) <= self.ttl {
            return Some(entry.clone());
        }

        let stale = entries.remove(&owner_id)?;
        drop(entries);
        debug!(owner_id, "Evicted stale resource");
        self.release(owner_id, &stale.handle);
        None
    }

    fn release(&self, owner_id: u64, handle: &str) {
        if self.revoker.is_revocable(handle) {
            debug!(owner_id, handle = %handle, "Revoking resource handle");
            self.revoker.revoke(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::MockClock;

    #[derive(Default)]
    struct RecordingRevoker {
        revoked: Mutex<Vec<String>>,
    }

    impl RecordingRevoker {
        fn revoked(&self) -> Vec<String> {
            self.revoked.lock().clone()
        }
    }

    impl HandleRevoker for RecordingRevoker {
        fn is_revocable(&self, handle: &str) -> bool {
            handle.starts_with('h')
        }

        fn revoke(&self, handle: &str) {
            self.revoked.lock().push(handle.to_string());
        }
    }

    fn cache() -> (ResourceCache<MockClock>, Arc<RecordingRevoker>, MockClock) {
        let revoker = Arc::new(RecordingRevoker::default());
        let clock = MockClock::new();
        let cache =
            ResourceCache::with_clock(Duration::from_secs(300), revoker.clone(), clock.clone());
        (cache, revoker, clock)
    }

    #[test]
    fn get_returns_fresh_handle() {
        let (cache, revoker, _) = cache();
        cache.set(1, "h1", None);

        assert_eq!(cache.get(1), Some("h1".to_string()));
        assert!(cache.has(1));
        assert!(revoker.revoked().is_empty());
    }

    #[test]
    fn stale_entry_is_evicted_and_revoked() {
        let (cache, revoker, clock) = cache();
        cache.set(1, "h1", None);

        clock.advance(Duration::from_secs(301));

        assert_eq!(cache.get(1), None);
        assert!(!cache.has(1));
        assert!(cache.is_empty());
        assert_eq!(revoker.revoked(), vec!["h1".to_string()]);
    }

    #[test]
    fn entry_at_exact_ttl_is_still_fresh() {
        let (cache, _, clock) = cache();
        cache.set(1, "h1", None);

        clock.advance(Duration::from_secs(300));

        assert!(cache.has(1));
    }

    #[test]
    fn overwrite_revokes_previous_handle() {
        let (cache, revoker, _) = cache();
        cache.set(1, "h1", None);
        cache.set(1, "h2", None);

        assert_eq!(revoker.revoked(), vec!["h1".to_string()]);
        assert_eq!(cache.get(1), Some("h2".to_string()));
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let (cache, _, clock) = cache();
        cache.set(1, "h1", None);
        clock.advance(Duration::from_secs(200));
        cache.set(1, "h2", None);
        clock.advance(Duration::from_secs(200));

        assert_eq!(cache.get(1), Some("h2".to_string()));
    }

    #[test]
    fn non_revocable_handles_are_not_revoked() {
        let (cache, revoker, _) = cache();
        cache.set(1, "https://cdn.example.com/a.png", None);
        cache.set(1, "h2", None);
        cache.delete(1);

        assert_eq!(revoker.revoked(), vec!["h2".to_string()]);
    }

    #[test]
    fn delete_and_clear_revoke_once() {
        let (cache, revoker, _) = cache();
        cache.set(1, "h1", None);
        cache.set(2, "h2", None);
        cache.set(3, "h3", None);

        assert!(cache.delete(1));
        assert!(!cache.delete(1));
        cache.clear();
        cache.clear();

        let mut revoked = revoker.revoked();
        revoked.sort();
        assert_eq!(revoked, vec!["h1", "h2", "h3"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn get_or_set_with_keeps_fresh_handle() {
        let (cache, revoker, _) = cache();
        cache.set(1, "h1", None);

        let handle = cache.get_or_set_with(1, || ("h2".to_string(), None));

        assert_eq!(handle, "h1");
        assert_eq!(cache.get(1), Some("h1".to_string()));
        assert!(revoker.revoked().is_empty());
    }

    #[test]
    fn get_or_set_with_replaces_stale_handle() {
        let (cache, revoker, clock) = cache();
        cache.set(1, "h1", None);
        clock.advance(Duration::from_secs(301));

        let handle = cache.get_or_set_with(1, || ("h2".to_string(), None));

        assert_eq!(handle, "h2");
        assert_eq!(cache.get(1), Some("h2".to_string()));
        assert_eq!(revoker.revoked(), vec!["h1".to_string()]);
    }

    #[test]
    fn racing_get_or_set_with_builds_once() {
        let (cache, revoker, _) = cache();
        let cache = Arc::new(cache);
        let built = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handles: Vec<String> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                let built = built.clone();
                std::thread::spawn(move || {
                    cache.get_or_set_with(1, || {
                        built.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        (format!("h{i}"), None)
                    })
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|thread| thread.join().unwrap())
            .collect();

        assert_eq!(built.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(handles.iter().all(|handle| *handle == handles[0]));
        assert!(revoker.revoked().is_empty());
    }

    #[test]
    fn raw_data_is_kept_with_handle() {
        let (cache, _, _) = cache();
        cache.set(7, "h7", Some(Bytes::from_static(b"png")));

        assert_eq!(cache.get_raw(7), Some(Bytes::from_static(b"png")));
        assert_eq!(cache.get_raw(8), None);
    }
}
