//! Forced re-authentication hook
//!
//! When the server rejects a request with 401 the client tears down the
//! session and notifies a [`ReauthHandler`]. The host application decides
//! what "navigate to login" means; [`ReauthSignal`] is the default handler
//! and fans the event out over a broadcast channel.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const SIGNAL_CAPACITY: usize = 16;

/// Emitted once per 401 response.
#[derive(Debug, Clone, PartialEq)]
pub struct ReauthEvent {
    /// Request path that was rejected
    pub path: String,
    /// Where the user should be sent to sign in again
    pub login_path: String,
    pub occurred_at: DateTime<Utc>,
}

impl ReauthEvent {
    pub fn new(path: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self { path: path.into(), login_path: login_path.into(), occurred_at: Utc::now() }
    }
}

/// Receives forced re-authentication requests.
///
/// Called after the session has already been cleared. Must not block.
pub trait ReauthHandler: Send + Sync {
    fn force_reauthentication(&self, event: ReauthEvent);
}

/// Broadcast-backed [`ReauthHandler`].
#[derive(Debug, Clone)]
pub struct ReauthSignal {
    sender: broadcast::Sender<ReauthEvent>,
}

impl ReauthSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReauthEvent> {
        self.sender.subscribe()
    }
}

impl Default for ReauthSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReauthHandler for ReauthSignal {
    fn force_reauthentication(&self, event: ReauthEvent) {
        warn!(path = %event.path, login_path = %event.login_path, "Session expired, re-authentication required");
        if self.sender.send(event).is_err() {
            debug!("No re-authentication listeners attached");
        }
    }
}
