//! Rendering of emitted updates.

use std::fmt;

use serde_json::{Value, json};

use super::Emitted;
use crate::update::Update;

/// How emitted updates are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line, in the replay script's own event format.
    #[default]
    Json,
    /// One human-readable line per update.
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl OutputFormat {
    /// Renders one emitted update as a single line, without the newline.
    #[must_use]
    pub fn render(self, emitted: &Emitted) -> String {
        let at_ms = u64::try_from(emitted.at.as_millis()).unwrap_or(u64::MAX);
        match self {
            Self::Json => to_json(at_ms, &emitted.update).to_string(),
            Self::Text => format!("{at_ms:>6}ms  {}", emitted.update),
        }
    }
}

fn to_json(at_ms: u64, update: &Update) -> Value {
    match update {
        Update::Link(link) => json!({
            "at_ms": at_ms,
            "type": "link",
            "index": link.index,
            "name": link.state.name,
            "state": link.state.oper_state.to_string(),
            "flags": link.state.flags,
        }),
        Update::Addr(addr) => {
            let mut value = json!({
                "at_ms": at_ms,
                "type": "addr",
                "index": addr.index,
                "prefix": addr.prefix.to_string(),
                "op": if addr.is_add { "add" } else { "del" },
                "flags": addr.flags,
                "scope": addr.scope,
            });
            // Lifetimes are only present when the producer supplied them.
            if let Some(lft) = addr.preferred_lifetime {
                value["preferred_lft"] = json!(lft.as_secs());
            }
            if let Some(lft) = addr.valid_lifetime {
                value["valid_lft"] = json!(lft.as_secs());
            }
            value
        }
    }
}
