//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::replay::OutputFormat;

/// flap-filter: interface update flap damping
///
/// Replays recorded link and address updates through the flap filter and
/// prints what it emits.
#[derive(Debug, Parser)]
#[command(name = "flap-filter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// How long an address removal is held back, in milliseconds
    #[arg(long = "damping-delay-ms", global = true)]
    pub damping_delay_ms: Option<u64>,

    /// Capacity of the channels between the filter and its producer and consumer
    #[arg(long = "channel-capacity", global = true)]
    pub channel_capacity: Option<usize>,

    /// Output format for emitted updates
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for flap-filter
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "flap-filter.toml")]
        output: PathBuf,
    },

    /// Replay a JSON-lines script of updates through the filter
    Replay {
        /// Path to the script
        script: PathBuf,
    },
}

/// Output format argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// One JSON object per line
    #[value(name = "json")]
    Json,
    /// Human-readable lines
    #[value(name = "text")]
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Text => Self::Text,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }
}
