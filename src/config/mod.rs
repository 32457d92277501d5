//! Configuration management for module bootstrapping
//!
//! Handles configuration loading (JSON or TOML), defaults and environment
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::registry::DEFAULT_REMOTE_MODULE_NAME;
use crate::module::traits::RemoteDefinition;

/// Environment variable overriding the configured log filter
pub const LOG_FILTER_ENV: &str = "MODULE_BOOTSTRAP_LOG";

/// Remote modules configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotesConfig {
    /// Remotes to register at startup
    #[serde(default)]
    pub definitions: Vec<RemoteDefinition>,

    /// Name of the module every remote exposes
    #[serde(default = "default_exposed_module")]
    pub exposed_module: String,
}

fn default_exposed_module() -> String {
    DEFAULT_REMOTE_MODULE_NAME.to_string()
}

impl Default for RemotesConfig {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            exposed_module: default_exposed_module(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "module_bootstrap=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON logs (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,

    /// Remote modules configuration
    #[serde(default)]
    pub remotes: RemotesConfig,
}

impl BootstrapConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            other => anyhow::bail!("Unsupported configuration format: {:?}", other),
        }
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
            self.logging.get_or_insert_with(LoggingConfig::default).filter = Some(filter);
        }
        self
    }

    /// Remote names declared in configuration
    pub fn remote_names(&self) -> Vec<&str> {
        self.remotes
            .definitions
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }
}
