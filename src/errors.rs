//! Error types for the mergemark engine.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`EngineError`] enum unifies them for callers that want a
//! single error type.
//!
//! Malformed conflict markers are deliberately **not** represented here: a
//! candidate region with missing or out-of-order markers simply yields no
//! conflict and scanning continues (see `parse`).

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

// ---------------------------------------------------------------------------
// Host buffer errors
// ---------------------------------------------------------------------------

/// Errors from the host text-buffer collaborator.
///
/// These indicate programmer misuse of the buffer API (stale handles,
/// out-of-bounds rows), never malformed document content.
#[derive(Debug, Error)]
pub enum BufferError {
    /// A row past the end of the buffer was addressed.
    #[error("row {row} is out of bounds (last row is {last})")]
    RowOutOfBounds { row: usize, last: usize },

    /// A range with `end < start` or an end past the buffer was given.
    #[error("invalid row range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    /// A marker handle that was never created or was already destroyed.
    #[error("stale marker handle {0}")]
    StaleMarker(usize),
}

// ---------------------------------------------------------------------------
// Stream errors
// ---------------------------------------------------------------------------

/// Errors from the streamed conflict counter.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying byte stream failed; no partial count is reported.
    #[error("conflict count stream error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = BufferError::RowOutOfBounds { row: 12, last: 4 };
        assert_eq!(err.to_string(), "row 12 is out of bounds (last row is 4)");

        let err = BufferError::StaleMarker(7);
        assert_eq!(err.to_string(), "stale marker handle 7");

        let err = StreamError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_engine_error_from_subsystem() {
        let buf_err = BufferError::InvalidRange { start: 5, end: 2 };
        let engine_err: EngineError = buf_err.into();
        assert!(matches!(engine_err, EngineError::Buffer(_)));
    }
}
