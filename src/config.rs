//! Engine configuration
//!
//! The slot marker is the text joined between static segments before the
//! template markup is parsed; every occurrence of it in the parsed fragment
//! is a slot. The event prefix selects which attributes bind event handlers.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Configuration options for the rendering engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Text standing in for each slot while the template markup is parsed
    pub marker: String,

    /// Attribute name prefix that binds event handlers (`onclick` → `click`)
    pub event_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            marker: "{{}}".to_string(),
            event_prefix: "on".to_string(),
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    engine: Option<TomlEngine>,
}

#[derive(Deserialize)]
struct TomlEngine {
    marker: Option<String>,
    event_prefix: Option<String>,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot marker text
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the event attribute prefix
    pub fn with_event_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.event_prefix = prefix.into();
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(engine) = parsed.engine {
            if let Some(marker) = engine.marker {
                config.marker = marker;
            }
            if let Some(prefix) = engine.event_prefix {
                config.event_prefix = prefix;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the marker can survive markup parsing unambiguously
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::Invalid {
                field: "marker",
                reason: "must not be empty",
            });
        }
        if self
            .marker
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '=' | '&' | '/'))
        {
            return Err(ConfigError::Invalid {
                field: "marker",
                reason: "must not contain whitespace or any of < > \" ' = & /",
            });
        }
        if self.event_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "event_prefix",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}
