//! Configuration loader

use std::path::Path;

use talonbridge_utils::{config_file, BridgeError, Result};

use super::AppConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.sync.readiness_attempts == 0 {
            return Err(BridgeError::config("readiness_attempts must be at least 1"));
        }

        if config.sync.command_attempts == 0 {
            return Err(BridgeError::config("command_attempts must be at least 1"));
        }

        if config.sidecar.timeout_ms < 10 {
            return Err(BridgeError::config("sidecar timeout_ms must be at least 10"));
        }

        if config.host.product.trim().is_empty() {
            return Err(BridgeError::config("host product must not be empty"));
        }

        Ok(())
    }

    /// Load and validate
    pub fn load_and_validate() -> Result<AppConfig> {
        let config = Self::load()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load and validate a specific file
    pub fn load_and_validate_path(path: &Path) -> Result<AppConfig> {
        let config = if path.exists() {
            Self::load_from_path(path)?
        } else {
            AppConfig::default()
        };
        Self::validate(&config)?;
        Ok(config)
    }
}
