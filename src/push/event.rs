//! Orchestrator events

use crate::registry::{SourceEvent, SourceRef};

/// Identifies one egress session created by an orchestrator
///
/// Ids are never reused by the same orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything that can change a managed source's push state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A source was registered or unregistered
    SourceChanged(SourceEvent),

    /// Outcome of the initial publish (`code == 0` is success)
    PublishResult {
        session: SessionId,
        code: i32,
        message: String,
    },

    /// A published session stopped unexpectedly
    Shutdown {
        session: SessionId,
        code: i32,
        message: String,
    },
}

impl PushEvent {
    /// Registration change for `source`
    pub fn source_changed(source: SourceRef, registered: bool) -> Self {
        PushEvent::SourceChanged(SourceEvent { source, registered })
    }
}

impl From<SourceEvent> for PushEvent {
    fn from(event: SourceEvent) -> Self {
        PushEvent::SourceChanged(event)
    }
}
