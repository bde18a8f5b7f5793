//! Error types
//!
//! Only startup and wiring failures surface as [`Error`]. Failures the engine
//! reports through session callbacks are logged and counted instead.

use crate::engine::SourceKey;

/// Error type for yuv-pusher operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pixel plane could not be reserved
    #[error("Failed to allocate {bytes} bytes for {plane} plane")]
    Allocation {
        /// Plane name ("Y", "U" or "V")
        plane: &'static str,
        /// Requested size in bytes
        bytes: usize,
    },

    /// The engine has no source with this key
    #[error("Source not found: {0}")]
    SourceNotFound(SourceKey),

    /// The engine refused to create an egress session
    #[error("Failed to create session: {0}")]
    SessionCreate(String),

    /// An actor mailbox was closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
