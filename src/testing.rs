//! Test doubles for the engine seams

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{EgressSession, MediaIntake, PushEngine, SessionReporter};
use crate::error::{Error, Result};
use crate::media::VideoFrame;
use crate::registry::SourceRef;

/// Observes a [`FakeSession`] after it has been handed over
#[derive(Debug, Default)]
pub struct SessionTracker {
    published: Mutex<Vec<String>>,
    releases: AtomicUsize,
}

impl SessionTracker {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().clone()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Session that records calls and reports nothing on its own
pub struct FakeSession {
    tracker: Arc<SessionTracker>,
}

impl FakeSession {
    pub fn new() -> (Self, Arc<SessionTracker>) {
        let tracker = Arc::new(SessionTracker::default());
        let session = Self {
            tracker: Arc::clone(&tracker),
        };
        (session, tracker)
    }
}

impl EgressSession for FakeSession {
    fn publish(&mut self, url: &str) {
        self.tracker.published.lock().push(url.to_string());
    }

    fn release(&mut self) {
        self.tracker.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Engine that hands out [`FakeSession`]s and keeps their reporters
#[derive(Default)]
pub struct RecordingEngine {
    created: Mutex<Vec<(SourceRef, Arc<SessionTracker>, SessionReporter)>>,
    fail: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create_session` calls fail
    pub fn fail_creation(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn source(&self, index: usize) -> SourceRef {
        self.created.lock()[index].0.clone()
    }

    pub fn tracker(&self, index: usize) -> Arc<SessionTracker> {
        Arc::clone(&self.created.lock()[index].1)
    }

    pub fn reporter(&self, index: usize) -> SessionReporter {
        self.created.lock()[index].2.clone()
    }
}

impl PushEngine for RecordingEngine {
    type Session = FakeSession;

    fn create_session(&self, source: &SourceRef, reporter: SessionReporter) -> Result<FakeSession> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::SessionCreate("refused".to_string()));
        }

        let (session, tracker) = FakeSession::new();
        self.created.lock().push((source.clone(), tracker, reporter));
        Ok(session)
    }
}

/// What the intake saw for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFrame {
    pub timestamp_ms: u64,
    pub strides: [usize; 3],
    pub plane_sizes: [usize; 3],
    /// The single value of each plane's logical region, `None` if the
    /// region was not uniform
    pub values: [Option<u8>; 3],
}

/// Intake that records every submission
#[derive(Debug, Default)]
pub struct RecordingIntake {
    frames: Mutex<Vec<SubmittedFrame>>,
}

impl RecordingIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<SubmittedFrame> {
        self.frames.lock().clone()
    }

    pub fn timestamps(&self) -> Vec<u64> {
        self.frames.lock().iter().map(|f| f.timestamp_ms).collect()
    }
}

fn uniform_value(plane: &[u8], stride: usize, width: usize, rows: usize) -> Option<u8> {
    let first = *plane.first()?;
    let uniform = plane
        .chunks(stride.max(1))
        .take(rows)
        .all(|row| row[..width].iter().all(|&b| b == first));
    uniform.then_some(first)
}

impl MediaIntake for RecordingIntake {
    fn submit_frame(&self, frame: &VideoFrame<'_>) {
        let luma_w = frame.width as usize;
        let luma_h = frame.height as usize;
        let dims = [
            (luma_w, luma_h),
            (luma_w / 2, luma_h / 2),
            (luma_w / 2, luma_h / 2),
        ];

        let mut values = [None; 3];
        for (i, (width, rows)) in dims.into_iter().enumerate() {
            values[i] = uniform_value(frame.planes[i], frame.strides[i], width, rows);
        }

        self.frames.lock().push(SubmittedFrame {
            timestamp_ms: frame.timestamp_ms,
            strides: frame.strides,
            plane_sizes: [
                frame.planes[0].len(),
                frame.planes[1].len(),
                frame.planes[2].len(),
            ],
            values,
        });
    }
}
