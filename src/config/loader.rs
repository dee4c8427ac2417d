use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::AtomConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl AtomConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/xatom/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("xatom").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `AtomConfig::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(AtomConfig::default());
        }

        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: AtomConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AtomConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - No directive name is empty
    /// - The data prefix ends with `-`
    /// - Text and repeat directives use different attribute names
    pub fn validate(&self) -> Result<(), ConfigError> {
        let directives = &self.directives;
        let named = [
            ("directives.text", &directives.text),
            ("directives.repeat", &directives.repeat),
            ("directives.template_tag", &directives.template_tag),
            ("directives.data_prefix", &directives.data_prefix),
            ("directives.default_index_name", &directives.default_index_name),
        ];

        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("'{}' must not be empty", field),
                });
            }
        }

        if !directives.data_prefix.ends_with('-') {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Data prefix '{}' must end with '-'",
                    directives.data_prefix
                ),
            });
        }

        if directives.text == directives.repeat {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Text and repeat directives both use attribute '{}'",
                    directives.text
                ),
            });
        }

        Ok(())
    }
}
