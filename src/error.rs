//! Error types for the ITCH replay engine.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//!
//! Only [`ItchError::CaptureOpen`] is fatal. Every error on the per-message
//! path (unknown reference, broken replacement chain, unexpected chain head)
//! is recoverable: the offending execution is dropped with a diagnostic and
//! the replay continues.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ITCH replay operations.
pub type Result<T> = std::result::Result<T, ItchError>;

/// Main error type for ITCH replay operations.
#[derive(Error, Debug)]
pub enum ItchError {
    /// The capture file could not be opened or mapped, or is empty.
    #[error("Cannot open capture {path}: {reason}")]
    CaptureOpen { path: PathBuf, reason: String },

    /// An execution references an order that is not in the index.
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    /// A replacement chain points to a predecessor that no longer exists.
    #[error("Broken replacement chain at reference {0}")]
    BrokenChain(u64),

    /// A replacement chain terminated at a message that is not an add.
    #[error("Unexpected message type '{kind}' at head of chain for reference {reference}")]
    UnexpectedChainHead { reference: u64, kind: char },

    /// Writing an hourly report failed.
    #[error("Failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ItchError {
    /// Create a capture-open error from any string-like reason.
    pub fn capture_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ItchError::CaptureOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ItchError::OrderNotFound(12345);
        assert_eq!(err.to_string(), "Order not found: 12345");

        let err = ItchError::UnexpectedChainHead {
            reference: 7,
            kind: 'X',
        };
        assert_eq!(
            err.to_string(),
            "Unexpected message type 'X' at head of chain for reference 7"
        );
    }

    #[test]
    fn test_capture_open_constructor() {
        let err = ItchError::capture_open("/tmp/x", "no such file");
        assert!(matches!(err, ItchError::CaptureOpen { .. }));
        assert_eq!(err.to_string(), "Cannot open capture /tmp/x: no such file");
    }
}
