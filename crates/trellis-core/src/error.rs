//! Error types for trellis.

use thiserror::Error;

/// The main error type for trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// A GPU buffer allocation failed.
    ///
    /// Fatal in practice (downstream rendering cannot proceed), but surfaced
    /// as a value so callers decide how loudly to die.
    #[error("buffer allocation failed for '{label}' ({bytes} bytes)")]
    AllocationFailed {
        /// Debug label of the buffer that failed to allocate.
        label: String,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An element index is out of range for its array.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A shader with the given identifier is already registered.
    #[error("shader '{0}' already registered")]
    ShaderExists(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
