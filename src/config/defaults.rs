//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default damping delay in milliseconds.
pub const DAMPING_DELAY_MS: u64 = 100;

/// Default capacity of the filter's channels.
pub const CHANNEL_CAPACITY: usize = 64;

/// Default damping delay as Duration.
#[must_use]
pub const fn damping_delay() -> Duration {
    Duration::from_millis(DAMPING_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FLAP_DAMPING_DELAY;

    #[test]
    fn damping_delay_matches_filter_default() {
        assert_eq!(damping_delay(), FLAP_DAMPING_DELAY);
    }
}
