//! Error types for the update filter.

use std::fmt;

use thiserror::Error;

/// One of the two filtered output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    /// Filtered link updates.
    Link,
    /// Filtered address updates.
    Address,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Address => write!(f, "address"),
        }
    }
}

/// Error type for the filter loop.
///
/// Cancellation is a normal shutdown and is reported as `Ok(())`, not here.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The consumer of an output stream went away.
    ///
    /// The update being sent is lost, and the loop stops because no later
    /// update on that stream could be delivered either.
    #[error("Filtered {stream} stream closed by its consumer")]
    OutputClosed {
        /// The stream whose receiver was dropped
        stream: OutputStream,
    },
}
