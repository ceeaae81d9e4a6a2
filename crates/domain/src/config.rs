//! Configuration structures
//!
//! Every section deserializes with defaults so partial config files are
//! accepted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEDUP_TTL_MS, DEFAULT_API_URL, DEVELOPMENT_TIMEOUT_SECS, KEYCHAIN_SERVICE, LOGIN_PATH,
    MAX_RETRIES, PRODUCTION_TIMEOUT_SECS, PROFILE_STORAGE_KEY, RESOURCE_CACHE_TTL_SECS,
    RETRY_BASE_DELAY_MS, TOKEN_STORAGE_KEY,
};
use crate::errors::BackofficeError;

/// Deployment mode of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Request timeout for this mode.
    pub fn default_timeout(self) -> Duration {
        match self {
            Self::Development => Duration::from_secs(DEVELOPMENT_TIMEOUT_SECS),
            Self::Production => Duration::from_secs(PRODUCTION_TIMEOUT_SECS),
        }
    }
}

impl FromStr for Environment {
    type Err = BackofficeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(BackofficeError::Config(format!("Unknown environment: {other}"))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Retry budget for connection-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Re-issues allowed after the first attempt
    pub max_retries: u32,
    /// Linear backoff unit: retry `n` waits `n * base_delay_ms`
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: MAX_RETRIES, base_delay_ms: RETRY_BASE_DELAY_MS }
    }
}

/// Transport settings for the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every relative request path is resolved against
    pub base_url: String,
    pub environment: Environment,
    /// Overrides the mode-dependent timeout when set
    pub timeout_secs: Option<u64>,
    pub retry: RetryConfig,
    /// Lifetime of an in-flight deduplication entry
    pub dedup_ttl_ms: u64,
    /// Rewrite `http` URLs to `https` before sending
    pub upgrade_insecure: bool,
    /// Entry point reported to the re-authentication hook
    pub login_path: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.environment.default_timeout())
    }

    /// Connectivity retries are disabled in development so failures surface
    /// immediately.
    pub fn retries_enabled(&self) -> bool {
        !self.environment.is_development()
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.dedup_ttl_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            environment: Environment::default(),
            timeout_secs: None,
            retry: RetryConfig::default(),
            dedup_ttl_ms: DEDUP_TTL_MS,
            upgrade_insecure: true,
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

/// Durable session storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keychain service the session slots live under
    pub service_name: String,
    pub token_key: String,
    pub profile_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_name: KEYCHAIN_SERVICE.to_string(),
            token_key: TOKEN_STORAGE_KEY.to_string(),
            profile_key: PROFILE_STORAGE_KEY.to_string(),
        }
    }
}

/// Resource cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub resource_ttl_secs: u64,
}

impl CacheConfig {
    pub fn resource_ttl(&self) -> Duration {
        Duration::from_secs(self.resource_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { resource_ttl_secs: RESOURCE_CACHE_TTL_SECS }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
}
