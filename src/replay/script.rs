//! Replay script parsing.
//!
//! A script is JSON lines, one event per line. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! {"at_ms": 0,  "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "del"}
//! {"at_ms": 20, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "add"}
//! {"at_ms": 40, "type": "link", "index": 3, "name": "eth0", "state": "up"}
//! ```

use std::path::Path;
use std::time::Duration;

use ipnet::IpNet;
use serde::Deserialize;

use super::ReplayError;
use crate::update::{AddrUpdate, InterfaceIndex, LinkState, LinkUpdate, OperState, Update};

/// An update and the offset from the start of the replay at which it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEvent {
    /// Offset from the start of the replay.
    pub at: Duration,
    /// The raw update.
    pub update: Update,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawEvent {
    Link {
        at_ms: u64,
        index: InterfaceIndex,
        #[serde(default)]
        name: String,
        #[serde(default)]
        state: RawOperState,
        #[serde(default)]
        flags: u32,
    },
    Addr {
        at_ms: u64,
        index: InterfaceIndex,
        prefix: String,
        op: RawOp,
        #[serde(default)]
        flags: u32,
        #[serde(default)]
        scope: u8,
        preferred_lft: Option<u64>,
        valid_lft: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawOp {
    Add,
    Del,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RawOperState {
    #[default]
    Unknown,
    NotPresent,
    Down,
    LowerLayerDown,
    Testing,
    Dormant,
    Up,
}

impl From<RawOperState> for OperState {
    fn from(raw: RawOperState) -> Self {
        match raw {
            RawOperState::Unknown => Self::Unknown,
            RawOperState::NotPresent => Self::NotPresent,
            RawOperState::Down => Self::Down,
            RawOperState::LowerLayerDown => Self::LowerLayerDown,
            RawOperState::Testing => Self::Testing,
            RawOperState::Dormant => Self::Dormant,
            RawOperState::Up => Self::Up,
        }
    }
}

impl RawEvent {
    const fn at_ms(&self) -> u64 {
        match self {
            Self::Link { at_ms, .. } | Self::Addr { at_ms, .. } => *at_ms,
        }
    }

    fn into_update(self, line: usize) -> Result<Update, ReplayError> {
        match self {
            Self::Link {
                index,
                name,
                state,
                flags,
                ..
            } => {
                let state = LinkState::new(name, state.into()).with_flags(flags);
                Ok(Update::Link(LinkUpdate::new(index, state)))
            }
            Self::Addr {
                index,
                prefix,
                op,
                flags,
                scope,
                preferred_lft,
                valid_lft,
                ..
            } => {
                let net = prefix
                    .parse::<IpNet>()
                    .map_err(|source| ReplayError::InvalidPrefix {
                        line,
                        value: prefix.clone(),
                        source,
                    })?;
                let update = AddrUpdate::new(index, net, matches!(op, RawOp::Add))
                    .with_flags(flags)
                    .with_scope(scope)
                    .with_lifetimes(
                        preferred_lft.map(Duration::from_secs),
                        valid_lft.map(Duration::from_secs),
                    );
                Ok(Update::Addr(update))
            }
        }
    }
}

/// Parses a replay script.
///
/// # Errors
///
/// Returns an error naming the 1-based line if an event is malformed,
/// carries an invalid prefix, or is earlier than the event before it.
pub fn parse_script(content: &str) -> Result<Vec<ReplayEvent>, ReplayError> {
    let mut events = Vec::new();
    let mut previous_ms = 0;

    for (i, text) in content.lines().enumerate() {
        let line = i + 1;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let raw: RawEvent =
            serde_json::from_str(text).map_err(|source| ReplayError::Parse { line, source })?;

        let at_ms = raw.at_ms();
        if at_ms < previous_ms {
            return Err(ReplayError::OutOfOrder {
                line,
                at_ms,
                previous_ms,
            });
        }
        previous_ms = at_ms;

        events.push(ReplayEvent {
            at: Duration::from_millis(at_ms),
            update: raw.into_update(line)?,
        });
    }

    Ok(events)
}

/// Loads and parses a replay script from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or [`parse_script`] fails.
pub fn load_script(path: &Path) -> Result<Vec<ReplayEvent>, ReplayError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReplayError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_script(&content)
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
