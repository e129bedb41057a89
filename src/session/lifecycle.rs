use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::error::{FrameError, Result};
use crate::diagnostics::stats::{ProcessingStats, StatsSnapshot};
use crate::frame::{compress, convert};
use crate::pipeline::detector::{EdgeDetector, Outcome};
use crate::settings::types::{ConfigError, OverlapPolicy, PipelineConfig};

/// Text returned by [`SessionLifecycle::get_stats`] with no active session.
pub const NOT_INITIALIZED: &str = "Processor not initialized";

/// Whether a processor session is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active,
}

/// One live processor: a detector plus the stats of the frames it handled.
pub struct ProcessorSession {
    detector: EdgeDetector,
    stats: ProcessingStats,
}

impl ProcessorSession {
    pub fn new(config: PipelineConfig) -> std::result::Result<Self, ConfigError> {
        let detector = EdgeDetector::new(config)?;
        debug!("processor session created");
        Ok(Self {
            detector,
            stats: ProcessingStats::new(),
        })
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Decode, detect edges, record timing, encode.
    ///
    /// Only the edge pipeline is timed. Stats are updated before encoding,
    /// so a frame whose encode fails is still counted.
    pub fn process(&mut self, buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let config = self.detector.config();
        let (quality, order) = (config.jpeg_quality, config.chroma_order);

        let image = convert::decode(buffer, width, height, order)?;

        let started = Instant::now();
        let (edges, outcome) = self.detector.process_with_outcome(&image);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Outcome::Degraded(_) = outcome {
            self.stats.record_degraded();
        }
        self.stats.record(elapsed_ms);

        Ok(compress::encode_jpeg(&edges, quality)?)
    }
}

impl Drop for ProcessorSession {
    fn drop(&mut self) {
        debug!(
            "processor session released after {} frames",
            self.stats.frame_count()
        );
    }
}

/// Owns the single active [`ProcessorSession`] and serialises every access
/// to it.
///
/// Session swap, frame processing and stats reads all go through one mutex,
/// so a frame can never observe a half-installed or released session.
/// Overlapping frames follow the configured [`OverlapPolicy`]. Only another
/// frame counts as an overlap: stats reads and lifecycle calls just wait
/// for the lock.
pub struct SessionLifecycle {
    config: PipelineConfig,
    session: Mutex<Option<ProcessorSession>>,
    /// Set while a frame is being processed under [`OverlapPolicy::Drop`].
    in_flight: AtomicBool,
    /// Frames rejected under [`OverlapPolicy::Drop`].
    dropped: AtomicU64,
}

/// Claim on the in-flight slot, released when the frame finishes.
struct FrameClaim<'a>(&'a AtomicBool);

impl Drop for FrameClaim<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionLifecycle {
    /// Create an uninitialised lifecycle that will build sessions from
    /// `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a lifecycle configured from `EDGEFRAME_CONFIG`.
    pub fn from_env() -> Self {
        Self::new(PipelineConfig::from_env())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Install a fresh session, releasing any existing one first.
    ///
    /// Previous stats are discarded. Returns `false` if the configuration
    /// cannot build a processor, leaving the lifecycle uninitialised.
    pub fn initialize(&self) -> bool {
        info!("Initializing edge processor");
        let mut slot = self.session.lock();
        if let Some(previous) = slot.take() {
            drop(previous);
            info!("Released previous edge processor");
        }
        self.dropped.store(0, Ordering::Relaxed);

        match ProcessorSession::new(self.config.clone()) {
            Ok(session) => {
                *slot = Some(session);
                true
            }
            Err(e) => {
                error!("Failed to initialize edge processor: {e}");
                false
            }
        }
    }

    /// Process one raw frame into JPEG bytes.
    ///
    /// Fails without side effects when uninitialised, when the buffer is
    /// malformed, or when another frame is in flight under the drop policy.
    pub fn process_frame(&self, buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let _claim = self.claim()?;
        let mut guard = self.session.lock();
        let Some(session) = guard.as_mut() else {
            error!("Processor not initialized");
            return Err(FrameError::Uninitialized);
        };
        session
            .process(buffer, width, height)
            .inspect_err(|e| error!("Frame {width}x{height} rejected: {e}"))
    }

    fn claim(&self) -> Result<Option<FrameClaim<'_>>> {
        match self.config.overlap_policy {
            OverlapPolicy::Serialize => Ok(None),
            OverlapPolicy::Drop => self
                .in_flight
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .map(|_| Some(FrameClaim(&self.in_flight)))
                .map_err(|_| {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!("Dropping frame, previous frame still processing ({dropped} dropped)");
                    FrameError::Busy
                }),
        }
    }

    /// Release the active session. Safe to call repeatedly.
    pub fn cleanup(&self) {
        if let Some(session) = self.session.lock().take() {
            info!("Cleaning up edge processor");
            drop(session);
        }
    }

    /// Stats summary of the active session, or [`NOT_INITIALIZED`].
    pub fn get_stats(&self) -> String {
        match self.session.lock().as_ref() {
            Some(session) => session.stats().summary(),
            None => NOT_INITIALIZED.to_string(),
        }
    }

    /// Serialisable stats of the active session.
    pub fn stats_snapshot(&self) -> Option<StatsSnapshot> {
        let guard = self.session.lock();
        let session = guard.as_ref()?;
        Some(StatsSnapshot {
            dropped_count: self.dropped.load(Ordering::Relaxed),
            ..session.stats().snapshot()
        })
    }

    pub fn state(&self) -> LifecycleState {
        if self.session.lock().is_some() {
            LifecycleState::Active
        } else {
            LifecycleState::Uninitialized
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Process-wide lifecycle used by the C ABI, configured from the
/// environment on first use.
pub fn global() -> &'static SessionLifecycle {
    static GLOBAL: OnceLock<SessionLifecycle> = OnceLock::new();
    GLOBAL.get_or_init(SessionLifecycle::from_env)
}
