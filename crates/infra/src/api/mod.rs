//! Back-office API transport
//!
//! # Architecture
//!
//! ```text
//! caller ──► ApiClient ──► RequestDeduplicator ──► Dispatcher ──► HttpClient
//!                                                     │
//!                      TokenStore (bearer) ◄──────────┤
//!                      classify (failures) ◄──────────┤
//!                      ReauthHandler (401) ◄──────────┘
//! ```
//!
//! - Identical concurrent requests share one round-trip
//! - Connectivity failures are retried with linear backoff outside development
//! - A 401 clears the session and forces re-authentication
//! - Every other failure is classified into a [`NormalizedError`](backoffice_domain::NormalizedError)

pub mod assets;
pub mod auth;
pub mod classifier;
pub mod client;
pub mod dedup;
pub mod endpoint;
pub mod errors;
pub mod reauth;

pub use assets::{avatar_path, AvatarLoader};
pub use auth::{AuthResponse, AuthService, Credentials, Registration};
pub use classifier::classify;
pub use client::{ApiClient, ApiClientBuilder};
pub use dedup::{request_key, RequestDeduplicator};
pub use endpoint::{resolve_url, upgrade_insecure};
pub use errors::{ApiError, RawFailure};
pub use reauth::{ReauthEvent, ReauthHandler, ReauthSignal};
