//! Error types for replay scripts.

use std::path::PathBuf;

use thiserror::Error;

use crate::filter::FilterError;

/// Error type for loading and replaying scripts.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to read the script file.
    #[error("Failed to read replay script '{}': {source}", path.display())]
    FileRead {
        /// Path to the script
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid event.
    #[error("Invalid event on line {line}: {source}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// An address event carries an unparsable prefix.
    #[error("Invalid prefix '{value}' on line {line}: {source}")]
    InvalidPrefix {
        /// 1-based line number
        line: usize,
        /// The rejected prefix text
        value: String,
        /// Underlying parse error
        #[source]
        source: ipnet::AddrParseError,
    },

    /// Event timestamps went backwards.
    #[error(
        "Event on line {line} at {at_ms}ms is earlier than the previous event at {previous_ms}ms"
    )]
    OutOfOrder {
        /// 1-based line number
        line: usize,
        /// Offset of the offending event
        at_ms: u64,
        /// Offset of the event before it
        previous_ms: u64,
    },

    /// The filter stopped with an error.
    #[error("Filter failed: {0}")]
    Filter(#[from] FilterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::OutputStream;
    use std::error::Error;

    #[test]
    fn out_of_order_displays_both_offsets() {
        let error = ReplayError::OutOfOrder {
            line: 4,
            at_ms: 10,
            previous_ms: 30,
        };
        assert_eq!(
            error.to_string(),
            "Event on line 4 at 10ms is earlier than the previous event at 30ms"
        );
    }

    #[test]
    fn filter_error_preserves_source() {
        let error: ReplayError = FilterError::OutputClosed {
            stream: OutputStream::Link,
        }
        .into();

        assert!(error.to_string().starts_with("Filter failed"));
        assert!(error.source().unwrap().to_string().contains("link stream"));
        assert!(matches!(error, ReplayError::Filter(_)));
    }

    #[test]
    fn invalid_prefix_preserves_source() {
        let source = "10.0.0.5/40".parse::<ipnet::IpNet>().unwrap_err();
        let error = ReplayError::InvalidPrefix {
            line: 2,
            value: "10.0.0.5/40".to_string(),
            source,
        };

        assert!(error.to_string().contains("line 2"));
        assert!(error.source().is_some());
    }
}
