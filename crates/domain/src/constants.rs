//! Application constants
//!
//! Centralized location for the API core's fixed values.

// Transport
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEVELOPMENT_TIMEOUT_SECS: u64 = 10;
pub const PRODUCTION_TIMEOUT_SECS: u64 = 60; // Backend cold starts can be slow
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

// Retry (connectivity failures only)
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

// Deduplication
pub const DEDUP_TTL_MS: u64 = 1_000;

// Resource cache
pub const RESOURCE_CACHE_TTL_SECS: u64 = 300;

// Session storage
pub const KEYCHAIN_SERVICE: &str = "Backoffice.session";
pub const TOKEN_STORAGE_KEY: &str = "token";
pub const PROFILE_STORAGE_KEY: &str = "user";

// Endpoints
pub const LOGIN_PATH: &str = "/login";
pub const AUTH_LOGIN_ENDPOINT: &str = "/auth/login";
pub const AUTH_REGISTER_ENDPOINT: &str = "/auth/register";
pub const AUTH_ME_ENDPOINT: &str = "/auth/me";
pub const HEALTH_ENDPOINT: &str = "/health";
