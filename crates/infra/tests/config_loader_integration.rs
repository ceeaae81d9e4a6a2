//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from it.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use backoffice_common::auth::{MemoryStorage, TokenStore};
use backoffice_domain::{BackofficeError, Environment};
use backoffice_infra::config;
use backoffice_infra::ApiClient;
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_full_config_from_json_file() {
    let path = write_config(
        r#"{
            "api": {
                "base_url": "https://admin.example.com/api",
                "environment": "production",
                "timeout_secs": 30,
                "retry": { "max_retries": 2, "base_delay_ms": 500 },
                "dedup_ttl_ms": 750,
                "upgrade_insecure": true,
                "login_path": "/sign-in"
            },
            "session": {
                "service_name": "Backoffice.integration",
                "token_key": "jwt",
                "profile_key": "profile"
            },
            "cache": { "resource_ttl_secs": 120 }
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("json config");

    assert_eq!(config.api.base_url, "https://admin.example.com/api");
    assert_eq!(config.api.environment, Environment::Production);
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.api.retry.max_retries, 2);
    assert_eq!(config.api.retry.base_delay(), Duration::from_millis(500));
    assert_eq!(config.api.dedup_ttl(), Duration::from_millis(750));
    assert_eq!(config.api.login_path, "/sign-in");
    assert_eq!(config.session.token_key, "jwt");
    assert_eq!(config.session.profile_key, "profile");
    assert_eq!(config.cache.resource_ttl(), Duration::from_secs(120));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_empty_toml_file_yields_defaults() {
    let path = write_config("", "toml");

    let config = config::load_from_file(Some(path.clone())).expect("toml config");

    assert_eq!(config, backoffice_domain::Config::default());
    assert_eq!(config.api.timeout(), Duration::from_secs(60));
    assert!(config.api.retries_enabled());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_loaded_config_builds_a_client() {
    let path = write_config(
        r#"
[api]
base_url = "http://localhost:8080/api"
environment = "development"
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("toml config");
    assert!(!config.api.retries_enabled());

    let tokens = Arc::new(TokenStore::from_config(Arc::new(MemoryStorage::new()), &config.session));
    let client = ApiClient::new(config.api.clone(), tokens).expect("client from config");
    assert_eq!(client.config().environment, Environment::Development);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/backoffice.json".into()));

    match result {
        Err(BackofficeError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let path = write_config(r#"{ "api": { "base_url": 42 } }"#, "json");

    match config::load_from_file(Some(path.clone())) {
        Err(BackofficeError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }

    std::fs::remove_file(path).ok();
}
