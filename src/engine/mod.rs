//! Media engine contracts
//!
//! The engine does the heavy lifting (encoding, protocol handling,
//! routing). This crate only drives it through three seams:
//!
//! - [`MediaIntake`] accepts raw pictures from the frame producer
//! - [`PushEngine`] creates egress sessions for registered sources
//! - [`EgressSession`] publishes one source to one remote URL
//!
//! Session outcomes come back through a [`SessionReporter`] instead of raw
//! callbacks, so they land in the orchestrator's mailbox as tagged events.
//! [`LocalEngine`] is an in-process implementation of all three.

pub mod local;
pub mod reporter;

pub use local::{LocalEngine, LocalSession, MediaChannel};
pub use reporter::SessionReporter;

pub use crate::registry::{SourceEvent, SourceKey, SourceRef, VideoInfo};

use crate::error::Result;
use crate::media::VideoFrame;

/// Raw picture intake of a source
///
/// Fire-and-forget: the call must not wait for encoding to finish and has
/// no failure path visible to the producer.
pub trait MediaIntake: Send + Sync {
    fn submit_frame(&self, frame: &VideoFrame<'_>);
}

/// Factory for egress sessions
pub trait PushEngine: Send + Sync {
    type Session: EgressSession;

    /// Create a session bound to `source`.
    ///
    /// The session reports its publish result and any later shutdown
    /// through `reporter`.
    fn create_session(&self, source: &SourceRef, reporter: SessionReporter)
        -> Result<Self::Session>;
}

/// One outbound push connection
pub trait EgressSession: Send {
    /// Start publishing to `url`. The outcome arrives asynchronously.
    fn publish(&mut self, url: &str);

    /// Tear the session down. Calling it more than once is a no-op.
    fn release(&mut self);
}
