//! Modular common utilities shared across Backoffice crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: clock abstraction, blob registry and resource cache
//! - `platform`: durable session storage and the token store

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{KeychainStorage, MemoryStorage, SessionStorage, StorageError, TokenStore};
#[cfg(feature = "runtime")]
pub use cache::{BlobRegistry, HandleRevoker, ResourceCache};
#[cfg(feature = "runtime")]
pub use resilience::{Clock, MockClock, SystemClock};
