//! # Configuration
//!
//! Runtime configuration of the back office (where the database lives,
//! where exports go, how verbose logging is). Business configuration
//! (rules, billing, catalog) is data in `AppSettings`, not here.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BRIIK_*`)
//! 2. Config file (`config.toml` in the platform config directory)
//! 3. Defaults (this file)
//!
//! ## Example `config.toml`
//! ```toml
//! database_path = "/srv/briik/briik.db"
//! export_dir = "/srv/briik/exports"
//! log_filter = "info,briik=debug,sqlx=warn"
//! invoice_retry_limit = 5
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default `tracing` filter when neither `RUST_LOG` nor `BRIIK_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,briik=debug,sqlx=warn";

pub const DEFAULT_INVOICE_RETRY_LIMIT: u32 = 5;

pub const ENV_DB_PATH: &str = "BRIIK_DB_PATH";
pub const ENV_EXPORT_DIR: &str = "BRIIK_EXPORT_DIR";
pub const ENV_LOG: &str = "BRIIK_LOG";
pub const ENV_INVOICE_RETRIES: &str = "BRIIK_INVOICE_RETRIES";

const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "briik.db";

/// Back office configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackofficeConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Directory for XML exports and rendered documents.
    pub export_dir: PathBuf,

    /// `tracing` filter directive.
    pub log_filter: String,

    /// Attempts at reserving an invoice number before giving up.
    pub invoice_retry_limit: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Could not read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Could not write config file {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Could not determine the platform directories")]
    NoPlatformDirs,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl Default for BackofficeConfig {
    /// Paths under the platform data directory, falling back to the current
    /// directory when it cannot be determined.
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        BackofficeConfig {
            database_path: data_dir.join(DATABASE_FILE_NAME),
            export_dir: data_dir.join("exports"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            invoice_retry_limit: DEFAULT_INVOICE_RETRY_LIMIT,
        }
    }
}

impl BackofficeConfig {
    /// Loads file (if present) + environment over defaults, then validates.
    pub fn load() -> ConfigResult<Self> {
        let path = default_config_path()?;
        let mut config = Self::load_file_or_default(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load) but never fails: problems are logged and
    /// defaults used instead.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid configuration, using defaults");
                BackofficeConfig::default()
            }
        }
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load_file_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(BackofficeConfig::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: BackofficeConfig = toml::from_str(&text).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Writes this configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |reason: String| ConfigError::Write {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| write_err(e.to_string()))?;

        info!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Applies `BRIIK_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup(ENV_EXPORT_DIR).filter(|v| !v.is_empty()) {
            self.export_dir = PathBuf::from(dir);
        }

        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_filter = filter;
        }

        if let Some(raw) = lookup(ENV_INVOICE_RETRIES) {
            self.invoice_retry_limit =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_INVOICE_RETRIES.to_string(),
                    value: raw.clone(),
                })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.invoice_retry_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "invoice_retry_limit".to_string(),
                value: "0".to_string(),
            });
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path".to_string(),
                value: String::new(),
            });
        }

        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("es", "briik", "backoffice")
}

/// `config.toml` in the platform config directory.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoPlatformDirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BackofficeConfig::default();
        assert_eq!(config.invoice_retry_limit, 5);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.database_path.ends_with("briik.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BackofficeConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_DB_PATH, "/tmp/x.db"),
                (ENV_EXPORT_DIR, "/tmp/out"),
                (ENV_LOG, "debug"),
                (ENV_INVOICE_RETRIES, " 9 "),
            ]))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.invoice_retry_limit, 9);
    }

    #[test]
    fn test_bad_retry_value_rejected() {
        let mut config = BackofficeConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_INVOICE_RETRIES, "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        config.invoice_retry_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip_and_partial_file() {
        let dir = std::env::temp_dir().join(format!("briik-config-{}", briik_core::new_id()));
        let path = dir.join(CONFIG_FILE_NAME);

        let config = BackofficeConfig {
            database_path: PathBuf::from("/data/briik.db"),
            export_dir: PathBuf::from("/data/out"),
            log_filter: "warn".to_string(),
            invoice_retry_limit: 3,
        };
        config.save(&path).unwrap();
        assert_eq!(BackofficeConfig::load_file_or_default(&path).unwrap(), config);

        std::fs::write(&path, "invoice_retry_limit = 7\n").unwrap();
        let partial = BackofficeConfig::load_file_or_default(&path).unwrap();
        assert_eq!(partial.invoice_retry_limit, 7);
        assert_eq!(partial.log_filter, DEFAULT_LOG_FILTER);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("briik-definitely-missing").join(CONFIG_FILE_NAME);
        assert_eq!(
            BackofficeConfig::load_file_or_default(&path).unwrap(),
            BackofficeConfig::default()
        );
    }
}
