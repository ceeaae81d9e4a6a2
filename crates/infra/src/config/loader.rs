//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Read a `.env` file into the process environment, if present
//! 2. Probe the standard locations for a config file (JSON or TOML); when
//!    none exists start from defaults
//! 3. Apply environment variable overrides on top
//!
//! ## Environment Variables
//! - `BACKOFFICE_API_URL`: API base URL
//! - `BACKOFFICE_ENV`: `development` or `production`
//! - `BACKOFFICE_API_TIMEOUT_SECS`: request timeout override in seconds
//! - `BACKOFFICE_UPGRADE_INSECURE`: rewrite `http` URLs to `https` (true/false)
//! - `BACKOFFICE_KEYCHAIN_SERVICE`: keychain service holding the session
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./backoffice.json` or `./backoffice.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use backoffice_domain::{BackofficeError, Config, Environment, Result};

pub const ENV_API_URL: &str = "BACKOFFICE_API_URL";
pub const ENV_ENVIRONMENT: &str = "BACKOFFICE_ENV";
pub const ENV_API_TIMEOUT_SECS: &str = "BACKOFFICE_API_TIMEOUT_SECS";
pub const ENV_UPGRADE_INSECURE: &str = "BACKOFFICE_UPGRADE_INSECURE";
pub const ENV_KEYCHAIN_SERVICE: &str = "BACKOFFICE_KEYCHAIN_SERVICE";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["backoffice.json", "backoffice.toml", "config.json", "config.toml"];

/// Load configuration with the layered strategy described above
///
/// # Errors
/// Returns `BackofficeError::Config` if a discovered file is invalid or an
/// environment override has an invalid value.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    tracing::info!(
        base_url = %config.api.base_url,
        environment = %config.api.environment,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from environment variables alone
///
/// `BACKOFFICE_API_URL` is required; everything else falls back to defaults.
///
/// # Errors
/// Returns `BackofficeError::Config` if the URL is missing or any variable
/// has an invalid value.
pub fn load_from_env() -> Result<Config> {
    env_var(ENV_API_URL)?;

    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Overwrite fields of `config` with any environment variables that are set.
///
/// # Errors
/// Returns `BackofficeError::Config` for unparseable values.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(url) = env_var(ENV_API_URL) {
        config.api.base_url = url;
    }

    if let Ok(environment) = env_var(ENV_ENVIRONMENT) {
        config.api.environment = environment.parse::<Environment>()?;
    }

    if let Ok(timeout) = env_var(ENV_API_TIMEOUT_SECS) {
        let secs = timeout
            .parse::<u64>()
            .map_err(|e| BackofficeError::Config(format!("Invalid API timeout: {}", e)))?;
        config.api.timeout_secs = Some(secs);
    }

    config.api.upgrade_insecure = env_bool(ENV_UPGRADE_INSECURE, config.api.upgrade_insecure);

    if let Ok(service) = env_var(ENV_KEYCHAIN_SERVICE) {
        config.session.service_name = service;
    }

    Ok(())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// file extension.
///
/// # Errors
/// Returns `BackofficeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BackofficeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BackofficeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BackofficeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BackofficeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Non-empty environment variable.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            BackofficeError::Config(format!("Missing required environment variable: {}", key))
        })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
