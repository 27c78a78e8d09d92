//! Bootstrap configuration
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`ZANA_*`)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! The first two are layered on top of [`TomlConfig`] by the service binary.
//! A missing TOML file is not an error: a warning is logged and defaults
//! apply. A file that exists but cannot be parsed is an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collection::Collection;
use crate::{Error, Result};

/// Environment variable naming the TOML file
pub const CONFIG_ENV_VAR: &str = "ZANA_CONFIG";

pub const DEFAULT_API_BASE_URL: &str = "https://my.living-apps.de/rest";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5731";

/// Configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the record store REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Session cookie sent with every record store request
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Endpoint of the photo extraction service; photo scan is off without it
    #[serde(default)]
    pub extraction_url: Option<String>,

    /// Address the dashboard API listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Photo scan switch per collection slug (default: enabled)
    #[serde(default)]
    pub photo_scan: HashMap<String, bool>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_cookie: None,
            extraction_url: None,
            bind_address: default_bind_address(),
            logging: LoggingConfig::default(),
            photo_scan: HashMap::new(),
        }
    }
}

impl TomlConfig {
    /// Whether photo scan is offered for `collection`
    pub fn photo_scan_enabled(&self, collection: Collection) -> bool {
        self.extraction_url.is_some()
            && self
                .photo_scan
                .get(collection.slug())
                .copied()
                .unwrap_or(true)
    }

    /// Reject values the service cannot start with
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("api_base_url", Some(&self.api_base_url)),
            ("extraction_url", self.extraction_url.as_ref()),
        ] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(Error::Config(format!(
                        "{} must be an http(s) URL, got '{}'",
                        name, url
                    )));
                }
            }
        }
        for slug in self.photo_scan.keys() {
            slug.parse::<Collection>().map_err(|_| {
                Error::Config(format!("Unknown collection in [photo_scan]: {}", slug))
            })?;
        }
        Ok(())
    }
}

/// Default TOML location: `<config_dir>/zana/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zana").join("config.toml"))
}

/// Resolve which TOML file to read
///
/// Explicit path, then `ZANA_CONFIG`, then the platform default.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    default_config_path()
}

/// Load the TOML configuration, falling back to defaults when absent
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("Could not determine config directory, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file not found at {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_photo_scan_requires_endpoint() {
        let mut config = TomlConfig::default();
        assert!(!config.photo_scan_enabled(Collection::Analysis));

        config.extraction_url = Some("http://localhost:9000/extract".to_string());
        assert!(config.photo_scan_enabled(Collection::Analysis));

        config.photo_scan.insert("analysen".to_string(), false);
        assert!(!config.photo_scan_enabled(Collection::Analysis));
        assert!(config.photo_scan_enabled(Collection::QuickAnalysis));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomlConfig {
            api_base_url: "ftp://example".to_string(),
            ..TomlConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.api_base_url = DEFAULT_API_BASE_URL.to_string();
        config.photo_scan.insert("rezepte".to_string(), true);
        assert!(config.validate().is_err());
    }
}
