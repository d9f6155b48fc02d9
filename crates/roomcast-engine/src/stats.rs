//! Session statistics collection.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;

use roomcast_ipc::SessionStats;

/// Collects per-session counters and produces snapshots for status events.
pub struct StatsTracker {
    start_time: RwLock<Option<Instant>>,
    frames: AtomicU64,
    frames_sent: AtomicU64,
    parts_uploaded: AtomicU32,
}

impl StatsTracker {
    /// Create a new tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            start_time: RwLock::new(None),
            frames: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            parts_uploaded: AtomicU32::new(0),
        }
    }

    /// Mark the session start for uptime and FPS calculation.
    pub fn start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    /// Record a composed frame.
    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame accepted by the live transport.
    pub fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a segment confirmed stored by the upload pipeline.
    pub fn record_part(&self) {
        self.parts_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames accepted by the live transport so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Get current statistics snapshot.
    pub fn snapshot(&self) -> SessionStats {
        let uptime = self
            .start_time
            .read()
            .map(|start| start.elapsed())
            .unwrap_or_default();

        let frames_sent = self.frames_sent.load(Ordering::Relaxed);
        let fps = if uptime.as_secs_f32() > 0.0 {
            frames_sent as f32 / uptime.as_secs_f32()
        } else {
            0.0
        };

        SessionStats {
            frames: self.frames.load(Ordering::Relaxed),
            frames_sent,
            fps,
            parts_uploaded: self.parts_uploaded.load(Ordering::Relaxed),
            uptime_seconds: uptime.as_secs(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_snapshots() {
        let stats = StatsTracker::new();
        stats.start();
        for _ in 0..10 {
            stats.record_frame();
        }
        for _ in 0..8 {
            stats.record_sent();
        }
        stats.record_part();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames, 10);
        assert_eq!(snapshot.frames_sent, 8);
        assert_eq!(snapshot.parts_uploaded, 1);
    }

    #[test]
    fn fps_is_zero_before_start() {
        let stats = StatsTracker::new();
        stats.record_sent();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.fps, 0.0);
        assert_eq!(snapshot.uptime_seconds, 0);
    }
}
