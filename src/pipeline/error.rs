use thiserror::Error;

/// Internal pipeline faults. These never reach the caller: the detector
/// logs them and returns the unprocessed frame instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineFault {
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    #[error("invalid Gaussian kernel size {0}")]
    KernelSize(usize),

    #[error("invalid Sobel aperture {0}")]
    Aperture(usize),

    #[error("stage buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}
