//! Session credential storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   TokenStore    │  Token + profile pair, cleared together
//! └────────┬────────┘
//!          │
//!          └──► SessionStorage     (durable key-value slots)
//!                   ├──► KeychainStorage   (platform keychain)
//!                   └──► MemoryStorage     (tests, ephemeral sessions)
//! ```
//!
//! The store is constructed once at application start and shared as an
//! `Arc<TokenStore>`; nothing here is a process global, so tests can build
//! isolated sessions.

pub mod keychain;
pub mod storage;
pub mod token_store;

pub use keychain::KeychainStorage;
pub use storage::{MemoryStorage, SessionStorage, StorageError};
pub use token_store::TokenStore;
