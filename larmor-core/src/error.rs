//! Structured error types for the Larmor toolkit.

use thiserror::Error;

/// Unified error type for all Larmor operations.
#[derive(Debug, Error)]
pub enum LarmorError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index-corresponding inputs of unequal length.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
    },

    /// Empty input where at least one element is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Point geometry too degenerate for a well-defined answer.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A work-crew item failed or its worker panicked.
    #[error("worker failure: {0}")]
    Worker(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the Larmor ecosystem.
pub type Result<T> = std::result::Result<T, LarmorError>;
