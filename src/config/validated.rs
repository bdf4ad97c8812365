//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::filter::DampingPolicy;
use crate::replay::OutputFormat;

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Damping policy for the filter
    pub damping: DampingPolicy,

    /// Capacity of the filter's channels
    pub channel_capacity: usize,

    /// Output format for emitted updates
    pub format: OutputFormat,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ damping_delay: {}ms, channel_capacity: {}, format: {} }}",
            self.damping.delay().as_millis(),
            self.channel_capacity,
            self.format,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The damping delay is zero
    /// - The channel capacity is zero
    /// - The TOML output format is not recognised
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let damping = DampingPolicy::new(Self::resolve_damping_delay(cli, toml)?);
        let channel_capacity = Self::resolve_channel_capacity(cli, toml)?;
        let format = Self::resolve_format(cli, toml)?;

        Ok(Self {
            damping,
            channel_capacity,
            format,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_damping_delay(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let millis = cli
            .damping_delay_ms
            .or_else(|| toml.and_then(|t| t.filter.damping_delay_ms))
            .unwrap_or(defaults::DAMPING_DELAY_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "damping_delay_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_millis(millis))
    }

    fn resolve_channel_capacity(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<usize, ConfigError> {
        let capacity = cli
            .channel_capacity
            .or_else(|| toml.and_then(|t| t.filter.channel_capacity))
            .unwrap_or(defaults::CHANNEL_CAPACITY);

        // tokio's bounded channels panic on zero capacity.
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { value: capacity });
        }

        Ok(capacity)
    }

    fn resolve_format(cli: &Cli, toml: Option<&TomlConfig>) -> Result<OutputFormat, ConfigError> {
        // CLI takes precedence
        if let Some(format) = cli.format {
            return Ok(format.into());
        }

        // Fall back to TOML
        match toml.and_then(|t| t.output.format.as_deref()) {
            Some(value) => parse_format(value),
            None => Ok(OutputFormat::default()),
        }
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_format(s: &str) -> Result<OutputFormat, ConfigError> {
    match s.to_lowercase().as_str() {
        "json" | "jsonl" => Ok(OutputFormat::Json),
        "text" | "plain" => Ok(OutputFormat::Text),
        _ => Err(ConfigError::InvalidFormat {
            value: s.to_string(),
        }),
    }
}
