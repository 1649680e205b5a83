//! Configuration management for the fgaschema service.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use fgaschema_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("config.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ErrorConfig;

/// Environment variable prefix, e.g. `FGASCHEMA_MODELS__DETAILED_ERRORS`.
pub const ENV_PREFIX: &str = "FGASCHEMA";

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Authorization model settings
    #[serde(default)]
    pub models: ModelSettings,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type. Only "memory" is available.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Authorization model write settings.
///
/// # Example YAML Configuration
///
/// ```yaml
/// models:
///   max_model_size_bytes: 1048576
///   detailed_errors: false
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelSettings {
    /// Upper bound on the serialized size of an accepted model.
    ///
    /// Environment variable: `FGASCHEMA_MODELS__MAX_MODEL_SIZE_BYTES`
    #[serde(default = "default_max_model_size")]
    pub max_model_size_bytes: usize,

    /// Include type and relation names in rejection messages.
    ///
    /// Environment variable: `FGASCHEMA_MODELS__DETAILED_ERRORS`
    #[serde(default = "default_true")]
    pub detailed_errors: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            max_model_size_bytes: default_max_model_size(),
            detailed_errors: true,
        }
    }
}

impl ModelSettings {
    /// Error reporting mode derived from these settings.
    pub fn error_config(&self) -> ErrorConfig {
        if self.detailed_errors {
            ErrorConfig::development()
        } else {
            ErrorConfig::production()
        }
    }
}

fn default_max_model_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_true() -> bool {
    true
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn environment() -> Environment {
    // Use __ as separator for nested keys: FGASCHEMA_LOGGING__LEVEL -> logging.level
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `FGASCHEMA_` and use `__` as separator.
    /// For example:
    /// - `FGASCHEMA_LOGGING__LEVEL=debug` overrides `logging.level`
    /// - `FGASCHEMA_MODELS__DETAILED_ERRORS=false` overrides `models.detailed_errors`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    ///
    /// Uses default values and allows overrides via FGASCHEMA_ prefixed env vars.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    valid_backends, self.storage.backend
                ),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        if self.models.max_model_size_bytes == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "models.max_model_size_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
