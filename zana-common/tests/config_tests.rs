//! Unit tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing TOML file falls back to defaults (never fatal)
//! - Partial TOML files fill the rest with defaults
//! - Malformed TOML is reported as a configuration error
//! - Explicit path > ZANA_CONFIG > platform default
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate ZANA_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use zana_common::config::{
    default_config_path, load_toml_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR,
    DEFAULT_API_BASE_URL,
};
use zana_common::{Collection, Error};

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes()).expect("Should write TOML");
    file
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_toml_config(Some(&missing)).expect("Missing file must not be fatal");
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let file = write_toml(
        r#"
session_cookie = "session=abc"
extraction_url = "http://localhost:9000/extract"

[logging]
level = "debug"

[photo_scan]
analyseergebnisse = false
"#,
    );

    let config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.session_cookie.as_deref(), Some("session=abc"));
    assert_eq!(config.logging.level, "debug");
    assert!(config.photo_scan_enabled(Collection::Analysis));
    assert!(!config.photo_scan_enabled(Collection::AnalysisResult));
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_toml("api_base_url = [");
    assert!(matches!(load_toml_config(Some(file.path())), Err(Error::Config(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_toml("api_base_url = \"my.living-apps.de\"");
    assert!(matches!(load_toml_config(Some(file.path())), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/zana-from-env.toml");

    let explicit = PathBuf::from("/tmp/zana-explicit.toml");
    assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_wins_over_default() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/zana-from-env.toml");

    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/zana-from-env.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_default_path_without_env() {
    env::remove_var(CONFIG_ENV_VAR);

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, default_config_path());
    if let Some(path) = resolved {
        assert!(path.ends_with("zana/config.toml"));
    }
}
