use thiserror::Error;

/// Reasons a raw camera buffer cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame buffer is empty")]
    Empty,

    #[error("invalid frame dimensions {width}x{height} (must be non-zero and even)")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("frame size mismatch: got {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Reasons a processed image cannot be compressed.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode an empty image")]
    EmptyImage,

    #[error("JPEG cannot carry {0}-channel images")]
    UnsupportedChannels(u8),

    #[error("image dimensions {width}x{height} exceed the JPEG limit")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("JPEG encoding failed: {0}")]
    Codec(#[from] image::ImageError),
}
