//! Error types for brlyt-common.

use thiserror::Error;

/// Common error type for brlyt byte-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("truncated input: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },

    /// A rewind or seek moved outside the buffer.
    #[error("seek to {position} is outside the buffer (length {len})")]
    SeekOutOfBounds { position: usize, len: usize },

    /// A backpatch targeted bytes that have not been written yet.
    #[error("patch at {position} (+{width}) is past the written length {len}")]
    PatchOutOfBounds {
        position: usize,
        width: usize,
        len: usize,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
