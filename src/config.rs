use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;
use crate::infrastructure::container::ContainerOptions;
use crate::logging::LoggingSettings;

/// Plugin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub name: String,
    pub version: String,
    /// Translation domain; defaults to the plugin name when absent.
    pub text_domain: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            name: "plugkit-plugin".to_string(),
            version: "0.1.0".to_string(),
            text_domain: None,
        }
    }
}

impl PluginConfig {
    pub fn text_domain(&self) -> &str {
        self.text_domain.as_deref().unwrap_or(&self.name)
    }
}

/// Top-level configuration, every section optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    pub plugin: PluginConfig,
    pub container: ContainerOptions,
    pub logging: LoggingSettings,
}

impl FrameworkConfig {
    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e))?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), plugin = %config.plugin.name, "Configuration loaded");
        Ok(config)
    }

    /// Like [`FrameworkConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No configuration file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(origin.to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugin.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "plugin.name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.container.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "container.max_depth".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        self.logging.filter()?;
        Ok(())
    }
}
