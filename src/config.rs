//! Configuration module for wirepool.
//!
//! Pool sizing and logging settings are read from a TOML file. Every
//! field has a default, so an empty file (or no file) is a valid
//! configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Top-level configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Context pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Number of contexts created eagerly when the pool is built
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum number of idle contexts kept for reuse
    #[serde(default = "default_max_free_count")]
    pub max_free_count: usize,
    /// Capacity of each context's I/O buffer in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_free_count: default_max_free_count(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl PoolConfig {
    /// Check the sizing rules and return the effective batch size.
    ///
    /// A batch larger than `max_free_count` is clamped down to it.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        validate_sizes(self.batch_size, self.max_free_count)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_batch_size() -> usize {
    64
}

fn default_max_free_count() -> usize {
    1024
}

fn default_buffer_size() -> usize {
    16 * 1024 // 16 KB
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pool sizing rules shared by every pool constructor.
pub(crate) fn validate_sizes(
    batch_size: usize,
    max_free_count: usize,
) -> Result<usize, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidBatchSize(batch_size));
    }
    if max_free_count == 0 {
        return Err(ConfigError::InvalidMaxFreeCount(max_free_count));
    }
    Ok(batch_size.min(max_free_count))
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))?;

        info!(
            path = %path.display(),
            batch_size = config.pool.batch_size,
            max_free_count = config.pool.max_free_count,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::TomlParse(PathBuf::new(), e))
    }
}

/// Configuration errors, including invalid pool construction arguments
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    TomlParse(PathBuf, #[source] toml::de::Error),
    #[error("Invalid batch size {0}: must be positive")]
    InvalidBatchSize(usize),
    #[error("Invalid max free count {0}: must be positive")]
    InvalidMaxFreeCount(usize),
    #[error("Pool requires a context creator")]
    MissingCreator,
}
