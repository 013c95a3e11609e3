//! Configuration loading utilities

use crate::Config;
use pmqgraph_common::Result as PmqResult;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for pmqgraph_common::PmqGraphError {
    fn from(err: ConfigError) -> Self {
        pmqgraph_common::PmqGraphError::config(err.to_string())
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        debug!(path = %path.as_ref().display(), "Loading configuration file");
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        Self::apply_env_overrides(&mut config)?;

        config.validate_all().map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Load configuration from the default locations with env overrides.
    ///
    /// `PMQGRAPH_CONFIG_PATH` wins, then `config.yaml`, then `config.yml`,
    /// then built-in defaults.
    pub fn load() -> PmqResult<Config> {
        let config = if let Ok(config_path) = env::var("PMQGRAPH_CONFIG_PATH") {
            Self::load_config(&config_path)?
        } else if Path::new("config.yaml").exists() {
            Self::load_config("config.yaml")?
        } else if Path::new("config.yml").exists() {
            Self::load_config("config.yml")?
        } else {
            debug!("No configuration file found, using built-in defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate_all().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PmqResult<Config> {
        Ok(Self::load_config(path)?)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        if let Ok(api_key) = env::var("TWFY_API_KEY") {
            config.twfy.api_key = api_key;
        }

        if let Ok(base_url) = env::var("TWFY_BASE_URL") {
            config.twfy.base_url = base_url;
        }

        if let Ok(timeout) = env::var("TWFY_TIMEOUT") {
            config.twfy.timeout_seconds =
                timeout.parse().map_err(|e| ConfigError::EnvParseError {
                    var: "TWFY_TIMEOUT".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Ok(dir) = env::var("PMQGRAPH_DATA_DIR") {
            config.data.workbook_dir = dir;
        }

        if let Ok(tab) = env::var("PMQGRAPH_DEFAULT_TAB") {
            config.data.default_tab = tab;
        }

        if let Ok(level) = env::var("PMQGRAPH_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}
