//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait covering the three primitives the
//! update filter needs: the current instant, elapsed time, and a one-shot
//! wake-up. Production code uses [`TokioClock`]; tests either run it on a
//! paused tokio runtime or inject their own implementation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// Abstraction over monotonic time and timers.
///
/// Implementations must agree with themselves: a future returned by
/// [`Clock::after`] completes no earlier than the moment [`Clock::now`]
/// has advanced by the requested delay.
///
/// # Example
///
/// ```
/// use flap_filter::time::{Clock, TokioClock};
///
/// let clock = TokioClock;
/// let start = clock.now();
/// assert!(clock.now() >= start);
/// ```
pub trait Clock: Send + Sync {
    /// One-shot wake-up future returned by [`Clock::after`].
    type Sleep: Future<Output = ()> + Send;

    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Returns a future that completes once `delay` has passed.
    fn after(&self, delay: Duration) -> Self::Sleep;

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is in the future.
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }

    /// Returns the time remaining until `later`, or zero if it has already passed.
    fn until(&self, later: Instant) -> Duration {
        later.saturating_duration_since(self.now())
    }
}

/// Production clock backed by the tokio timer.
///
/// On a runtime started with paused time this clock becomes fully
/// deterministic: `now` only moves when the runtime advances it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Sleep = Sleep;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn after(&self, delay: Duration) -> Self::Sleep {
        tokio::time::sleep(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Ready;
    use std::sync::Mutex;

    /// A clock frozen at a settable instant whose timers fire immediately.
    struct FrozenClock {
        now: Mutex<Instant>,
    }

    impl FrozenClock {
        fn new(now: Instant) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        fn set(&self, now: Instant) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for FrozenClock {
        type Sleep = Ready<()>;

        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }

        fn after(&self, _delay: Duration) -> Self::Sleep {
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock;
        let start = clock.now();

        tokio::time::advance(Duration::from_millis(250)).await;

        assert_eq!(clock.since(start), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_after_waits_for_delay() {
        let clock = TokioClock;
        let start = clock.now();

        clock.after(Duration::from_millis(100)).await;

        assert_eq!(clock.now() - start, Duration::from_millis(100));
    }

    #[test]
    fn since_saturates_for_future_instant() {
        let base = Instant::now();
        let clock = FrozenClock::new(base);

        assert_eq!(clock.since(base + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn until_reports_remaining_time() {
        let base = Instant::now();
        let clock = FrozenClock::new(base);
        let deadline = base + Duration::from_millis(100);

        assert_eq!(clock.until(deadline), Duration::from_millis(100));

        clock.set(base + Duration::from_millis(40));
        assert_eq!(clock.until(deadline), Duration::from_millis(60));

        clock.set(base + Duration::from_millis(400));
        assert_eq!(clock.until(deadline), Duration::ZERO);
    }

    #[test]
    fn tokio_clock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokioClock>();
    }

    #[test]
    fn tokio_clock_is_copy() {
        let clock1 = TokioClock;
        let clock2 = clock1;
        let _ = clock1.now();
        let _ = clock2.now();
    }
}
