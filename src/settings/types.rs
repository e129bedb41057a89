use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::compress::DEFAULT_JPEG_QUALITY;
use crate::frame::types::ChromaOrder;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do with a frame that arrives while the previous one is still
/// being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Reject the overlapping frame immediately.
    #[default]
    Drop,
    /// Block until the in-flight frame completes.
    Serialize,
}

/// Tuning parameters for the edge pipeline. Fixed once a processor is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Gradients at or below this are never edges.
    pub low_threshold: f64,
    /// Gradients above this always seed an edge.
    pub high_threshold: f64,
    /// Side of the square Gaussian kernel. Must be odd.
    pub blur_kernel_size: usize,
    /// Gaussian sigma; 0 derives it from the kernel size.
    pub blur_sigma: f64,
    /// Sobel aperture for gradient estimation: 3, 5 or 7.
    pub aperture_size: usize,
    pub jpeg_quality: u8,
    pub chroma_order: ChromaOrder,
    pub overlap_policy: OverlapPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            blur_kernel_size: 5,
            blur_sigma: 0.0,
            aperture_size: 3,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            chroma_order: ChromaOrder::default(),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter against the ranges the pipeline supports.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [self.low_threshold, self.high_threshold];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "thresholds must be finite and non-negative (low={}, high={})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.low_threshold > self.high_threshold {
            return Err(ConfigError::Invalid(format!(
                "low threshold {} exceeds high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "blur kernel size must be odd, got {}",
                self.blur_kernel_size
            )));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "blur sigma must be finite and non-negative, got {}",
                self.blur_sigma
            )));
        }
        if !matches!(self.aperture_size, 3 | 5 | 7) {
            return Err(ConfigError::Invalid(format!(
                "aperture size must be 3, 5 or 7, got {}",
                self.aperture_size
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
