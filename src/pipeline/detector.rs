use tracing::{trace, warn};

use super::error::PipelineFault;
use super::filters;
use crate::frame::types::CanonicalImage;
use crate::settings::types::{ConfigError, PipelineConfig};

/// How a call to [`EdgeDetector::process_with_outcome`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage ran.
    Processed,
    /// The input was empty and came back untouched.
    Passthrough,
    /// A stage failed; the returned image is a copy of the input.
    Degraded(PipelineFault),
}

/// Grayscale → blur → Canny → 3-channel edge map.
///
/// Holds nothing but its validated configuration, so one detector can be
/// shared freely and the same input always produces the same output.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    config: PipelineConfig,
}

impl EdgeDetector {
    /// Build a detector, rejecting configurations the filters cannot run.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline. Never fails: faults yield a copy of `image`.
    pub fn process(&self, image: &CanonicalImage) -> CanonicalImage {
        self.process_with_outcome(image).0
    }

    /// Run the pipeline and report which path the frame took.
    pub fn process_with_outcome(&self, image: &CanonicalImage) -> (CanonicalImage, Outcome) {
        if image.is_empty() {
            warn!(target: "pipeline::detector", "Input frame is empty, passing through");
            return (image.clone(), Outcome::Passthrough);
        }

        match self.run_stages(image) {
            Ok(edges) => (edges, Outcome::Processed),
            Err(fault) => {
                warn!(
                    target: "pipeline::detector",
                    "Edge pipeline fault on {}x{}x{} frame, returning original: {fault}",
                    image.width(),
                    image.height(),
                    image.channels()
                );
                (image.clone(), Outcome::Degraded(fault))
            }
        }
    }

    /// Every stage, with faults propagated to the caller.
    pub fn run_stages(&self, image: &CanonicalImage) -> Result<CanonicalImage, PipelineFault> {
        let (width, height) = (image.width() as usize, image.height() as usize);

        let gray = match image.channels() {
            3 => filters::luma_from_rgb(image.as_bytes(), width, height)?,
            1 => image.as_bytes().to_vec(),
            other => return Err(PipelineFault::UnsupportedChannels(other)),
        };
        trace!(target: "pipeline::detector", "grayscale {width}x{height}");

        let blurred = filters::gaussian_blur(
            &gray,
            width,
            height,
            self.config.blur_kernel_size,
            self.config.blur_sigma,
        )?;

        let edges = filters::canny(
            &blurred,
            width,
            height,
            self.config.low_threshold,
            self.config.high_threshold,
            self.config.aperture_size,
        )?;

        let rgb = filters::expand_to_rgb(&edges);
        CanonicalImage::from_raw(image.width(), image.height(), 3, rgb).ok_or(
            PipelineFault::BufferSize {
                expected: width * height * 3,
                actual: edges.len() * 3,
            },
        )
    }
}
