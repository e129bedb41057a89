use thiserror::Error;

use crate::frame::error::{DecodeError, EncodeError};

/// Failures surfaced to the caller of `process_frame`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("processor not initialized")]
    Uninitialized,

    #[error("malformed input: {0}")]
    MalformedInput(#[from] DecodeError),

    #[error("processor busy with a previous frame")]
    Busy,

    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodeError),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FrameError>;
