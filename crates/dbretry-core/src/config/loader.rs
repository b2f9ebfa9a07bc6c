//! Layered configuration loader
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (`<config dir>/dbretry.yaml` or `dbretry.yml`)
//! 3. Environment variables (DBRETRY_* prefix)
//! 4. Per-call overrides (handled by the caller, e.g. a `retry_limit` argument)

use crate::error::{Error, Result};
use crate::types::DbRetryConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::time::Duration;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["dbretry.yaml", "dbretry.yml"];

const ENV_MAX_ATTEMPTS: &str = "DBRETRY_MAX_ATTEMPTS";
const ENV_DELAY_MS: &str = "DBRETRY_DELAY_MS";
const ENV_DATABASE_URL: &str = "DBRETRY_DATABASE_URL";

/// Configuration loader
pub struct ConfigLoader {
    /// Directory searched for the config file
    config_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at the platform config directory
    /// (e.g. `~/.config/dbretry` on Linux)
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine config directory"))?;
        let base = Utf8PathBuf::from_path_buf(base)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 config path: {}", p.display())))?;

        Ok(Self {
            config_dir: base.join("dbretry"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Find the first existing config file in the config directory
    pub fn find_config_file(&self) -> Option<Utf8PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }

    /// Load configuration with layered precedence
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load(&self) -> Result<DbRetryConfig> {
        let config = match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path, "loading dbretry config");
                Self::load_yaml_file(&path)?
            }
            None => DbRetryConfig::default(),
        };

        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply env overrides
    pub fn load_file(path: &Utf8Path) -> Result<DbRetryConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }

        let config = Self::apply_env_overrides(Self::load_yaml_file(path)?)?;
        config.validate()?;
        Ok(config)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<DbRetryConfig> {
        let content = fs::read_to_string(path)?;
        let config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: DbRetryConfig) -> Result<DbRetryConfig> {
        if let Ok(val) = env::var(ENV_MAX_ATTEMPTS) {
            let max_attempts: u32 = val.parse().map_err(|_| {
                Error::invalid_config(format!("{} must be a valid number", ENV_MAX_ATTEMPTS))
            })?;
            config.retry = config.retry.with_max_attempts(max_attempts);
        }

        if let Ok(val) = env::var(ENV_DELAY_MS) {
            let delay_ms: u64 = val.parse().map_err(|_| {
                Error::invalid_config(format!("{} must be a valid number", ENV_DELAY_MS))
            })?;
            config.retry = config.retry.with_delay(Duration::from_millis(delay_ms));
        }

        if let Ok(val) = env::var(ENV_DATABASE_URL) {
            config.database.url = Some(val);
        }

        Ok(config)
    }
}
