//! Source identity and registration notifications
//!
//! A source is identified by its vhost/app/stream tuple and is announced
//! once per protocol it is reachable under.

/// Unique identifier for a source (vhost + app + stream name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    /// Virtual host (e.g., "__defaultVhost__")
    pub vhost: String,
    /// Application name (e.g., "live")
    pub app: String,
    /// Stream name (e.g., "test")
    pub stream: String,
}

impl SourceKey {
    /// Create a new source key
    pub fn new(
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            vhost: vhost.into(),
            app: app.into(),
            stream: stream.into(),
        }
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.vhost, self.app, self.stream)
    }
}

/// A source as seen under one protocol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Short lowercase protocol token (e.g., "rtsp")
    pub schema: String,
    /// Source identity
    pub key: SourceKey,
}

impl SourceRef {
    pub fn new(schema: impl Into<String>, key: SourceKey) -> Self {
        Self {
            schema: schema.into(),
            key,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.schema, self.key)
    }
}

/// Source registration change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    /// The source that changed
    pub source: SourceRef,
    /// `true` when the source became available, `false` when it went away
    pub registered: bool,
}

impl SourceEvent {
    pub fn registered(source: SourceRef) -> Self {
        Self {
            source,
            registered: true,
        }
    }

    pub fn unregistered(source: SourceRef) -> Self {
        Self {
            source,
            registered: false,
        }
    }
}

/// Video codec the engine encodes raw pictures with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    #[default]
    H264,
    H265,
}

/// Video track parameters declared when a source is created
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    /// Target bitrate in bits per second
    pub bitrate: u32,
}

impl VideoInfo {
    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self {
            codec: VideoCodec::default(),
            width,
            height,
            fps,
            bitrate: crate::config::DEFAULT_BITRATE,
        }
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }
}

impl From<&crate::config::PushConfig> for VideoInfo {
    fn from(config: &crate::config::PushConfig) -> Self {
        Self::new(config.width, config.height, config.fps as f32).with_bitrate(config.bitrate)
    }
}
