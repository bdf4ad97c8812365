//! Flap filter for interface update streams.
//!
//! This module provides:
//! - The filter loop and its spawned form ([`UpdateFilter`], [`FilterHandle`])
//! - The damping delay configuration ([`DampingPolicy`])
//! - Per-interface deferral queues and coalescing ([`QueueTable`])
//! - Output plumbing ([`UpdateSenders`])
//! - Error handling ([`FilterError`])

mod engine;
mod error;
mod policy;
mod queue;
mod scheduler;

pub use engine::{FilterHandle, UpdateFilter};
pub use error::{FilterError, OutputStream};
pub use policy::{DampingPolicy, FLAP_DAMPING_DELAY};
pub use queue::{Coalesced, DeferredEntry, QueueTable};
pub use scheduler::{MIN_WAKEUP_DELAY, UpdateSenders};
