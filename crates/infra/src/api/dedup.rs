//! In-flight request deduplication
//!
//! Concurrent calls with the same method, URL and body share one network
//! round-trip. The first caller's future is stored as a
//! [`Shared`](futures::future::Shared) future; later callers clone it and
//! observe the same resolution or rejection.
//!
//! Entries leave the registry either when their request completes or when a
//! sweep finds them older than the TTL. Each entry carries a unique id so the
//! completion hook never removes a newer entry registered under the same key
//! after a sweep.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use backoffice_common::resilience::{Clock, SystemClock};
use backoffice_domain::constants::DEDUP_TTL_MS;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, trace};

/// Future handed to every caller sharing a key.
pub type SharedResult<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct PendingEntry<T, E> {
    id: u64,
    created_at: Instant,
    future: SharedResult<T, E>,
}

struct Registry<T, E> {
    entries: HashMap<String, PendingEntry<T, E>>,
    next_id: u64,
}

impl<T, E> Registry<T, E> {
    fn sweep(&mut self, now: Instant, ttl: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= ttl);
        let swept = before - self.entries.len();
        if swept > 0 {
            trace!(swept, "Swept stale pending requests");
        }
    }

    /// Remove `key` only if it still holds entry `id`.
    fn complete(&mut self, key: &str, id: u64) {
        if self.entries.get(key).is_some_and(|entry| entry.id == id) {
            self.entries.remove(key);
        }
    }
}

/// Deterministic identity of a logical request: `METHOD:url:json(body)`.
///
/// A missing or `null` body serializes as the empty JSON string (`""`).
pub fn request_key(method: &Method, url: &str, body: Option<&Value>) -> String {
    let serialized = match body {
        Some(Value::Null) | None => Value::String(String::new()).to_string(),
        Some(value) => value.to_string(),
    };
    format!("{method}:{url}:{serialized}")
}

/// Registry of in-flight requests keyed by [`request_key`].
pub struct RequestDeduplicator<T, E, C = SystemClock>
where
    C: Clock,
{
    registry: Arc<Mutex<Registry<T, E>>>,
    ttl: Duration,
    clock: C,
}

impl<T, E> RequestDeduplicator<T, E, SystemClock>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<T, E> Default for RequestDeduplicator<T, E, SystemClock>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(Duration::from_millis(DEDUP_TTL_MS))
    }
}

impl<T, E, C> RequestDeduplicator<T, E, C>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Create a deduplicator with a custom clock (useful for testing)
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry { entries: HashMap::new(), next_id: 0 })),
            ttl,
            clock,
        }
    }

    /// Run `request_fn` unless an identical request is already pending, in
    /// which case the pending outcome is shared.
    ///
    /// Sweeping, the lookup and the registration happen under one lock, so two
    /// callers racing on the same key cannot both start a request.
    pub fn execute_unique<F, Fut>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        request_fn: F,
    ) -> SharedResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key = request_key(method, url, body);
        let now = self.clock.now();

        let mut registry = self.registry.lock();
        registry.sweep(now, self.ttl);

        if let Some(entry) = registry.entries.get(&key) {
            debug!(%method, url, "Sharing in-flight request");
            return entry.future.clone();
        }

        let id = registry.next_id;
        registry.next_id += 1;

        let request = request_fn();
        let hook_registry = Arc::clone(&self.registry);
        let hook_key = key.clone();
        let future = async move {
            let outcome = request.await;
            hook_registry.lock().complete(&hook_key, id);
            outcome
        }
        .boxed()
        .shared();

        registry.entries.insert(key, PendingEntry { id, created_at: now, future: future.clone() });
        future
    }

    /// Number of registered entries, stale ones included until the next call.
    pub fn pending_count(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
