//! Deterministic replay of recorded interface updates.
//!
//! This module provides:
//! - JSON-lines script parsing ([`parse_script`], [`load_script`])
//! - A driver that feeds a script through an [`UpdateFilter`](crate::filter::UpdateFilter)
//!   and records what it emits ([`replay`])
//! - Output rendering ([`OutputFormat`])
//! - Error handling ([`ReplayError`])
//!
//! Run under a paused tokio clock, a replay takes no wall time and always
//! produces the same emission offsets.

mod driver;
mod error;
mod report;
mod script;

pub use driver::{Emitted, replay};
pub use error::ReplayError;
pub use report::OutputFormat;
pub use script::{ReplayEvent, load_script, parse_script};
