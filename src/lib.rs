//! Per-frame edge detection for live camera previews.
//!
//! A host hands raw 4:2:0 camera buffers to a [`SessionLifecycle`] and gets
//! JPEG-encoded edge maps back, plus running throughput stats. The
//! [`ffi`] module exposes the same four calls over a C ABI.

pub mod diagnostics;
pub mod ffi;
pub mod frame;
pub mod pipeline;
pub mod session;
pub mod settings;

pub use diagnostics::stats::{ProcessingStats, StatsSnapshot};
pub use frame::types::{CanonicalImage, ChromaOrder};
pub use pipeline::detector::{EdgeDetector, Outcome};
pub use session::error::FrameError;
pub use session::lifecycle::{global, LifecycleState, SessionLifecycle};
pub use settings::types::{ConfigError, OverlapPolicy, PipelineConfig};
