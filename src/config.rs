//! Configuration management for prom-relabel
//!
//! Handles loading relabel rules from YAML files.
//!
//! ```yaml
//! relabel_configs:
//!   - source_labels: [__name__]
//!     regex: "^go_.*"
//!     action: drop
//!   - regex: "^temp_.*"
//!     action: labeldrop
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::relabel::{RelabelConfig, RelabelEngine};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] crate::error::RelabelError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Relabel rules, applied in order
    #[serde(default)]
    pub relabel_configs: Vec<RelabelConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed. Rule
    /// validation happens in [`Config::build_engine`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        tracing::debug!(
            path = %path.display(),
            rules = config.relabel_configs.len(),
            "Loaded relabel configuration"
        );
        Ok(config)
    }

    /// Parse configuration from YAML text
    ///
    /// An empty document yields an empty rule list.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Validate the rules and build a relabel engine from them
    pub fn build_engine(&self) -> Result<RelabelEngine, ConfigError> {
        Ok(RelabelEngine::build(self.relabel_configs.iter().cloned())?)
    }
}
