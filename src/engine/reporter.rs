//! Session outcome reporting

use tokio::sync::mpsc;

use crate::push::{PushEvent, SessionId};

/// Delivers one session's result and shutdown notifications to its
/// orchestrator
///
/// Cheap to clone and usable from any thread. Every event is tagged with
/// the session id so the orchestrator can drop reports from sessions it has
/// already released.
#[derive(Debug, Clone)]
pub struct SessionReporter {
    session: SessionId,
    tx: mpsc::UnboundedSender<PushEvent>,
}

impl SessionReporter {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<PushEvent>) -> Self {
        Self { session, tx }
    }

    /// Id of the session this reporter belongs to
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Report the outcome of `publish`. `code == 0` means success.
    pub fn on_result(&self, code: i32, message: impl Into<String>) {
        self.send(PushEvent::PublishResult {
            session: self.session,
            code,
            message: message.into(),
        });
    }

    /// Report that a published session stopped unexpectedly
    pub fn on_shutdown(&self, code: i32, message: impl Into<String>) {
        self.send(PushEvent::Shutdown {
            session: self.session,
            code,
            message: message.into(),
        });
    }

    fn send(&self, event: PushEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(session = %self.session, "Orchestrator gone, report dropped");
        }
    }
}
