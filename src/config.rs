//! Pusher configuration

use crate::engine::SourceKey;
use crate::error::{Error, Result};
use crate::media::ColorMode;
use crate::scheme::scheme_of;

/// Default picture width
pub const DEFAULT_WIDTH: u32 = 640;
/// Default picture height
pub const DEFAULT_HEIGHT: u32 = 360;
/// Default frame rate
pub const DEFAULT_FPS: u32 = 25;
/// Default encoder bitrate handed to the engine (bits per second)
pub const DEFAULT_BITRATE: u32 = 2 * 1024 * 1024;
/// Highest frame rate that still yields a non-zero millisecond interval
pub const MAX_FPS: u32 = 1000;

/// Configuration for one synthetic source and its push target
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Where to publish (e.g. `rtsp://host/live/test`)
    pub target_url: String,

    /// Picture width in pixels
    pub width: u32,

    /// Picture height in pixels
    pub height: u32,

    /// Frames per second
    pub fps: u32,

    /// How per-frame colors are generated
    pub color_mode: ColorMode,

    /// Seed for the color generator (None = seeded from entropy)
    pub seed: Option<u64>,

    /// Row strides are rounded up to a multiple of this value
    pub stride_align: usize,

    /// Encoder bitrate handed to the engine
    pub bitrate: u32,

    /// Virtual host of the synthesized source
    pub vhost: String,

    /// Application name of the synthesized source
    pub app: String,

    /// Stream name of the synthesized source
    pub stream: String,

    /// Protocols the engine registers the source under
    /// (empty = only the target URL's own scheme)
    pub enabled_schemas: Vec<String>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            color_mode: ColorMode::default(),
            seed: None,
            stride_align: 1,
            bitrate: DEFAULT_BITRATE,
            vhost: "__defaultVhost__".to_string(),
            app: "live".to_string(),
            stream: "test".to_string(),
            enabled_schemas: Vec::new(),
        }
    }
}

impl PushConfig {
    /// Create a config targeting `url` with default picture settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            target_url: url.into(),
            ..Default::default()
        }
    }

    /// Set picture dimensions
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set frame rate
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set color generation policy
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    /// Use a fixed seed for reproducible colors
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set stride alignment (values below 1 are treated as 1)
    pub fn stride_align(mut self, align: usize) -> Self {
        self.stride_align = align.max(1);
        self
    }

    /// Set encoder bitrate
    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set the source identity
    pub fn source(
        mut self,
        vhost: impl Into<String>,
        app: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        self.vhost = vhost.into();
        self.app = app.into();
        self.stream = stream.into();
        self
    }

    /// Register the source under an additional protocol
    pub fn enable_schema(mut self, schema: impl Into<String>) -> Self {
        self.enabled_schemas.push(schema.into().to_ascii_lowercase());
        self
    }

    /// Key of the synthesized source
    pub fn source_key(&self) -> SourceKey {
        SourceKey::new(&self.vhost, &self.app, &self.stream)
    }

    /// Inter-frame interval in milliseconds (`1000 / fps`, truncated)
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.fps.max(1))
    }

    /// Protocols to register the source under.
    ///
    /// Falls back to the target URL's own scheme so that only the push
    /// protocol gets a source.
    pub fn schemas(&self) -> Vec<String> {
        if !self.enabled_schemas.is_empty() {
            return self.enabled_schemas.clone();
        }
        scheme_of(&self.target_url).into_iter().collect()
    }

    /// Check the configuration for values the producer cannot run with
    pub fn validate(&self) -> Result<()> {
        if scheme_of(&self.target_url).is_none() {
            return Err(Error::InvalidConfig(format!(
                "target url '{}' has no scheme",
                self.target_url
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "picture size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(Error::InvalidConfig(format!(
                "fps must be in 1..={}, got {}",
                MAX_FPS, self.fps
            )));
        }
        Ok(())
    }
}
