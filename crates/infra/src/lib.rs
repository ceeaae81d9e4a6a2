//! # Backoffice Infrastructure
//!
//! Impure half of the back-office API core.
//!
//! This crate contains:
//! - The retrying HTTP transport
//! - The API client (deduplication, session teardown, error classification)
//! - Login/logout and avatar loading on top of the client
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Session storage and caches come from `backoffice-common`
//! - Types and configuration come from `backoffice-domain`
//! - Contains all I/O (network, keychain via the token store, config files)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, AuthService, AvatarLoader, ReauthEvent,
    ReauthHandler, ReauthSignal,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
