//! Damping policy for potential flaps.

use std::time::Duration;

/// Default time a removal is held back before it is considered genuine.
pub const FLAP_DAMPING_DELAY: Duration = Duration::from_millis(100);

/// Policy for holding back updates that may be part of a flap.
///
/// # Deferral Semantics
///
/// | Update | Interface queue | Ready at |
/// |--------|-----------------|----------|
/// | Address add | empty | forwarded immediately |
/// | Address add | non-empty | now, behind queued entries |
/// | Address remove | any | now + delay |
/// | Link change | empty | forwarded immediately |
/// | Link change | non-empty | now + delay |
///
/// An address update that matches a queued update for the same prefix
/// inherits the queued entry's deadline, so a prefix that keeps flapping is
/// never pushed out past its first deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DampingPolicy {
    delay: Duration,
}

impl DampingPolicy {
    /// Creates a damping policy with the specified delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Returns the damping delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for DampingPolicy {
    /// Uses [`FLAP_DAMPING_DELAY`], long enough to cover the remove/re-add
    /// pair some DHCP clients emit while renewing a lease.
    fn default() -> Self {
        Self::new(FLAP_DAMPING_DELAY)
    }
}
