//! Source entry and state types
//!
//! This module defines the per-source state stored in the registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::broadcast;

use super::frame::RawFrame;
use super::source::VideoInfo;

/// Entry for a single source in the registry
pub struct SourceEntry {
    /// Protocols the source is registered under
    pub schemas: Vec<String>,

    /// Declared video track
    pub video: VideoInfo,

    /// Broadcast sender for fan-out to sessions
    tx: broadcast::Sender<RawFrame>,

    /// Frames accepted from the intake
    frames_in: AtomicU64,

    /// Frames skipped because no session was listening
    frames_skipped: AtomicU64,

    /// When the source was registered
    pub registered_at: Instant,
}

impl SourceEntry {
    /// Create a new source entry
    pub(super) fn new(schemas: Vec<String>, video: VideoInfo, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);

        Self {
            schemas,
            video,
            tx,
            frames_in: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            registered_at: Instant::now(),
        }
    }

    /// Number of sessions currently consuming frames
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe to this source's frames
    pub(super) fn subscribe(&self) -> broadcast::Receiver<RawFrame> {
        self.tx.subscribe()
    }

    /// Send a frame to all sessions
    ///
    /// The frame is only built when someone is listening. Returns the number
    /// of receivers that got it.
    pub(super) fn send_with(&self, make: impl FnOnce() -> RawFrame) -> usize {
        self.frames_in.fetch_add(1, Ordering::Relaxed);

        if self.tx.receiver_count() == 0 {
            self.frames_skipped.fetch_add(1, Ordering::Relaxed);
            return 0;
        }

        self.tx.send(make()).unwrap_or(0)
    }

    /// Snapshot of this entry's counters
    pub fn stats(&self) -> SourceStats {
        SourceStats {
            schemas: self.schemas.clone(),
            receiver_count: self.receiver_count(),
            frames_in: self.frames_in.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Statistics for a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    /// Protocols the source is registered under
    pub schemas: Vec<String>,
    /// Number of sessions consuming frames
    pub receiver_count: usize,
    /// Frames accepted from the intake
    pub frames_in: u64,
    /// Frames nobody was listening for
    pub frames_skipped: u64,
}
