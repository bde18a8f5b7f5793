//! Statistics for the producer and the push lifecycle

use std::time::{Duration, Instant};

/// Frame producer statistics
#[derive(Debug, Clone)]
pub struct ProducerStats {
    /// Frames handed to the intake
    pub frames_submitted: u64,
    /// Timestamp of the last submitted frame
    pub last_timestamp_ms: Option<u64>,
    /// When the producer was created
    pub started_at: Instant,
}

impl ProducerStats {
    pub fn new() -> Self {
        Self {
            frames_submitted: 0,
            last_timestamp_ms: None,
            started_at: Instant::now(),
        }
    }

    /// Record one submitted frame
    pub fn record_frame(&mut self, timestamp_ms: u64) {
        self.frames_submitted += 1;
        self.last_timestamp_ms = Some(timestamp_ms);
    }

    /// Get duration since the producer started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Measured frame rate
    pub fn calculated_framerate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_submitted as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for ProducerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Push lifecycle statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushStats {
    /// Sessions created and published
    pub sessions_created: u64,
    /// Sessions released
    pub sessions_released: u64,
    /// Session creations the engine refused
    pub create_failures: u64,
    /// Publish results with code 0
    pub publish_successes: u64,
    /// Publish results with a non-zero code
    pub publish_failures: u64,
    /// Shutdown reports from live sessions
    pub interruptions: u64,
    /// Registrations for other protocols or sources
    pub ignored_events: u64,
    /// Reports from sessions that were already released
    pub stale_events: u64,
    /// Registration notifications dropped because the actor fell behind
    pub lagged_notifications: u64,
}

impl PushStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently alive (0 or 1 for a single managed source)
    pub fn live_sessions(&self) -> u64 {
        self.sessions_created.saturating_sub(self.sessions_released)
    }
}
