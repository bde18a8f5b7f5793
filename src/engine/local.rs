//! In-process engine
//!
//! Stands in for an external media server: sources are registered in a
//! [`SourceRegistry`], raw frames are fanned out to sessions, and sessions
//! "publish" by consuming their source until it closes. No encoding or
//! network I/O takes place.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::PushConfig;
use crate::error::{Error, Result};
use crate::media::VideoFrame;
use crate::registry::{RawFrame, RegistryConfig, SourceRegistry};
use crate::scheme::scheme_of;

use super::{
    EgressSession, MediaIntake, PushEngine, SessionReporter, SourceEvent, SourceKey, SourceRef,
    VideoInfo,
};

/// Protocols a local session accepts as push targets
pub const SUPPORTED_SCHEMAS: &[&str] = &["rtsp", "rtmp", "srt", "webr"];

/// Result code for a target whose scheme is not supported
pub const ERR_UNSUPPORTED_SCHEMA: i32 = -1;

/// Shutdown code when the source goes away mid-stream
pub const ERR_SOURCE_CLOSED: i32 = -2;

/// Result code when no Tokio runtime is available to run the session
pub const ERR_NO_RUNTIME: i32 = -3;

/// In-process engine
///
/// Sessions run on the Tokio runtime that was current when the engine was
/// created, so registration callbacks may be delivered from any thread.
pub struct LocalEngine {
    registry: Arc<SourceRegistry>,
    schemas: Vec<String>,
    runtime: Option<Handle>,
}

impl LocalEngine {
    /// Create an engine that registers sources under `schemas`
    pub fn new(schemas: Vec<String>) -> Self {
        Self::with_registry_config(schemas, RegistryConfig::default())
    }

    /// Create an engine with custom registry configuration
    pub fn with_registry_config(schemas: Vec<String>, config: RegistryConfig) -> Self {
        Self {
            registry: Arc::new(SourceRegistry::with_config(config)),
            schemas,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Run sessions on `handle` instead of the runtime captured at creation
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Create an engine registering only the protocols `config` asks for
    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(config.schemas())
    }

    /// Get a reference to the source registry
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Subscribe to registration notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SourceEvent> {
        self.registry.subscribe_events()
    }

    /// Create a media source. It is announced by
    /// [`MediaChannel::init_complete`].
    pub fn create_media(&self, key: SourceKey, video: VideoInfo) -> MediaChannel {
        MediaChannel {
            key,
            video,
            schemas: self.schemas.clone(),
            registry: Arc::clone(&self.registry),
            registered: AtomicBool::new(false),
        }
    }
}

impl PushEngine for LocalEngine {
    type Session = LocalSession;

    fn create_session(&self, source: &SourceRef, reporter: SessionReporter) -> Result<LocalSession> {
        if !self.schemas.iter().any(|s| *s == source.schema) {
            return Err(Error::SessionCreate(format!(
                "protocol '{}' not enabled",
                source.schema
            )));
        }

        let frames = self.registry.subscribe_frames(&source.key)?;
        Ok(LocalSession::new(
            source.clone(),
            frames,
            reporter,
            self.runtime.clone(),
        ))
    }
}

/// Raw-picture source inside the local engine
///
/// Frames submitted before [`init_complete`](Self::init_complete) or after
/// [`release`](Self::release) are dropped.
pub struct MediaChannel {
    key: SourceKey,
    video: VideoInfo,
    schemas: Vec<String>,
    registry: Arc<SourceRegistry>,
    registered: AtomicBool,
}

impl MediaChannel {
    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    pub fn video(&self) -> &VideoInfo {
        &self.video
    }

    /// Mark all tracks added and register the source
    pub fn init_complete(&self) {
        if self.registered.swap(true, Ordering::AcqRel) {
            return;
        }
        self.registry
            .register(&self.key, &self.schemas, self.video.clone());
    }

    /// Unregister the source. Safe to call repeatedly.
    pub fn release(&self) {
        if self.registered.swap(false, Ordering::AcqRel) {
            self.registry.unregister(&self.key);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

impl MediaIntake for MediaChannel {
    fn submit_frame(&self, frame: &VideoFrame<'_>) {
        if !self.is_registered() {
            tracing::debug!(source = %self.key, ts = frame.timestamp_ms, "Frame dropped, source not registered");
            return;
        }

        let delivered = self
            .registry
            .broadcast_with(&self.key, || RawFrame::from_video_frame(frame));

        tracing::trace!(
            source = %self.key,
            ts = frame.timestamp_ms,
            delivered = ?delivered,
            "Frame submitted"
        );
    }
}

impl Drop for MediaChannel {
    fn drop(&mut self) {
        self.release();
    }
}

/// Egress session of the local engine
///
/// Publishing spawns a task that consumes the source's frames. The task
/// reports a shutdown if the source closes while it is running.
pub struct LocalSession {
    source: SourceRef,
    frames: Option<broadcast::Receiver<RawFrame>>,
    reporter: SessionReporter,
    runtime: Option<Handle>,
    task: Option<JoinHandle<()>>,
    forwarded: Arc<AtomicU64>,
    released: bool,
}

impl LocalSession {
    fn new(
        source: SourceRef,
        frames: broadcast::Receiver<RawFrame>,
        reporter: SessionReporter,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            source,
            frames: Some(frames),
            reporter,
            runtime,
            task: None,
            forwarded: Arc::new(AtomicU64::new(0)),
            released: false,
        }
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Frames consumed since publishing started
    pub fn frames_forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl EgressSession for LocalSession {
    fn publish(&mut self, url: &str) {
        if self.released {
            tracing::warn!(source = %self.source, "Publish on released session ignored");
            return;
        }
        let Some(mut frames) = self.frames.take() else {
            tracing::debug!(source = %self.source, "Session already publishing");
            return;
        };

        let supported = scheme_of(url)
            .map(|s| SUPPORTED_SCHEMAS.contains(&s.as_str()))
            .unwrap_or(false);
        if !supported {
            self.reporter
                .on_result(ERR_UNSUPPORTED_SCHEMA, format!("unsupported push url: {}", url));
            return;
        }

        let Some(runtime) = self.runtime.as_ref() else {
            tracing::warn!(source = %self.source, url = %url, "No runtime to run session on");
            self.reporter.on_result(ERR_NO_RUNTIME, "no runtime");
            return;
        };

        let reporter = self.reporter.clone();
        let forwarded = Arc::clone(&self.forwarded);
        let url = url.to_string();

        self.task = Some(runtime.spawn(async move {
            reporter.on_result(0, "");

            loop {
                match frames.recv().await {
                    Ok(_frame) => {
                        forwarded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(url = %url, skipped = skipped, "Session lagged, frames skipped");
                    }
                    Err(RecvError::Closed) => {
                        reporter.on_shutdown(ERR_SOURCE_CLOSED, "source closed");
                        break;
                    }
                }
            }
        }));
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.frames = None;

        if let Some(task) = self.task.take() {
            task.abort();
        }

        tracing::debug!(
            source = %self.source,
            forwarded = self.frames_forwarded(),
            "Local session released"
        );
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.release();
    }
}
