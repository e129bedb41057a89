use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// A diagnostic line is emitted every this many frames.
pub const DIAGNOSTIC_INTERVAL: u64 = 30;

/// Text reported before any frame has been recorded.
pub const NO_FRAMES: &str = "No frames processed";

/// Cumulative timing for the frames a processor session has handled.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    frame_count: u64,
    total_processing_time_ms: f64,
    last_process_timestamp: Option<SystemTime>,
    degraded_count: u64,
}

/// The periodic report emitted every [`DIAGNOSTIC_INTERVAL`] frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticReport {
    pub frame: u64,
    pub avg_time_ms: f64,
    pub fps: f64,
}

/// Snapshot of processing stats for serialisation to a host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub frame_count: u64,
    pub total_processing_time_ms: f64,
    pub avg_time_ms: Option<f64>,
    pub fps: Option<f64>,
    pub degraded_count: u64,
    pub dropped_count: u64,
    pub last_process_timestamp_ms: Option<u64>,
}

impl ProcessingStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed frame.
    ///
    /// Returns the diagnostic report when this frame lands on the reporting
    /// interval; the same report is logged at info level.
    pub fn record(&mut self, processing_time_ms: f64) -> Option<DiagnosticReport> {
        self.frame_count += 1;
        self.total_processing_time_ms += processing_time_ms.max(0.0);
        self.last_process_timestamp = Some(SystemTime::now());

        if self.frame_count % DIAGNOSTIC_INTERVAL != 0 {
            return None;
        }
        let avg_time_ms = self.avg_time_ms()?;
        let fps = self.fps().unwrap_or(0.0);
        info!(
            target: "diagnostics::stats",
            "Frame {}: Processing time: {avg_time_ms:.2} ms, FPS: {fps:.2}",
            self.frame_count
        );
        Some(DiagnosticReport {
            frame: self.frame_count,
            avg_time_ms,
            fps,
        })
    }

    /// Count a frame that fell back to the unprocessed image.
    pub fn record_degraded(&mut self) {
        self.degraded_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn total_processing_time_ms(&self) -> f64 {
        self.total_processing_time_ms
    }

    pub fn degraded_count(&self) -> u64 {
        self.degraded_count
    }

    pub fn last_process_timestamp(&self) -> Option<SystemTime> {
        self.last_process_timestamp
    }

    /// Mean processing time, or `None` before the first frame.
    pub fn avg_time_ms(&self) -> Option<f64> {
        if self.frame_count == 0 {
            return None;
        }
        Some(self.total_processing_time_ms / self.frame_count as f64)
    }

    /// Sustainable frame rate implied by the mean processing time.
    pub fn fps(&self) -> Option<f64> {
        self.avg_time_ms()
            .filter(|avg| *avg > 0.0)
            .map(|avg| 1000.0 / avg)
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let Some(avg) = self.avg_time_ms() else {
            return NO_FRAMES.to_string();
        };
        format!(
            "frameCount={}, avgTimeMs={avg:.2}, fps={:.2}",
            self.frame_count,
            self.fps().unwrap_or(0.0)
        )
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Take a serialisable snapshot. `dropped_count` is filled in by the
    /// session, which tracks drops outside the stats lock.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frame_count: self.frame_count,
            total_processing_time_ms: self.total_processing_time_ms,
            avg_time_ms: self.avg_time_ms(),
            fps: self.fps(),
            degraded_count: self.degraded_count,
            dropped_count: 0,
            last_process_timestamp_ms: self
                .last_process_timestamp
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
        }
    }
}
