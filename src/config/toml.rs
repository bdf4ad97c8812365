//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Filter configuration section
    #[serde(default)]
    pub filter: FilterSection,

    /// Output configuration section
    #[serde(default)]
    pub output: OutputSection,
}

/// Filter configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Damping delay in milliseconds
    pub damping_delay_ms: Option<u64>,

    /// Channel capacity
    pub channel_capacity: Option<usize>,
}

/// Output configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Output format: "json" or "text"
    pub format: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# flap-filter Configuration File

[filter]
# How long an address removal is held back before it is emitted, in
# milliseconds. A re-add of the same prefix within this window squashes
# the removal. (default: 100)
damping_delay_ms = 100

# Capacity of the channels between the filter and its producer and
# consumer (default: 64)
# channel_capacity = 64

[output]
# Output format for emitted updates: "json" or "text" (default: json)
# format = "json"
"#
    .to_string()
}
