#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for kiln
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/kiln/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use core::{GeneralConfig, NetworkConfig, PathConfig};

use kiln_errors::{ConfigError, Error};
use kiln_types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join(constants::APP_DIR).join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config");
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(output) = std::env::var(constants::ENV_OUTPUT) {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: constants::ENV_OUTPUT.to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        if let Ok(concurrency) = std::env::var(constants::ENV_CONCURRENCY) {
            self.general.concurrency =
                concurrency.parse().map_err(|_| ConfigError::InvalidValue {
                    field: constants::ENV_CONCURRENCY.to_string(),
                    value: concurrency,
                })?;
        }

        if let Ok(timeout) = std::env::var(constants::ENV_FETCH_TIMEOUT) {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::ENV_FETCH_TIMEOUT.to_string(),
                value: timeout,
            })?;
        }

        if let Ok(cache_dir) = std::env::var(constants::ENV_CACHE_DIR) {
            if cache_dir.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: constants::ENV_CACHE_DIR.to_string(),
                    value: cache_dir,
                }
                .into());
            }
            self.paths.cache_path = Some(PathBuf::from(cache_dir));
        }

        Ok(())
    }

    /// Get the package cache path (with default)
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.paths.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(constants::APP_DIR)
                .join(constants::PACKAGES_DIR)
        })
    }

    /// Effective number of concurrent fetches
    #[must_use]
    pub fn concurrency(&self) -> usize {
        calculate_concurrency(self.general.concurrency)
    }
}

/// Calculate fetch concurrency based on CPU count
#[must_use]
pub fn calculate_concurrency(config_value: usize) -> usize {
    if config_value > 0 {
        config_value // User override
    } else {
        num_cpus::get().clamp(1, constants::MAX_AUTO_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_concurrency_wins() {
        assert_eq!(calculate_concurrency(3), 3);
    }

    #[test]
    fn auto_concurrency_is_bounded() {
        let auto = calculate_concurrency(0);
        assert!(auto >= 1);
        assert!(auto <= constants::MAX_AUTO_CONCURRENCY);
    }

    #[test]
    fn explicit_cache_path_is_used() {
        let mut config = Config::default();
        config.paths.cache_path = Some(PathBuf::from("/tmp/kiln-cache"));
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/kiln-cache"));
    }
}
