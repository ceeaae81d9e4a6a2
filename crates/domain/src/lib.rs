//! # Backoffice Domain
//!
//! Domain types shared by every Backoffice crate.
//!
//! This crate contains:
//! - Session and user profile types
//! - The normalized error shape surfaced to calling code
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Backoffice crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
