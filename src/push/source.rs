//! Managed source: one push target and its session slot
//!
//! The slot is owned exclusively by the `ManagedSource`; callers get no
//! handle to the session that could outlive a release.

use std::time::Instant;

use crate::engine::EgressSession;
use crate::registry::SourceRef;

use super::event::SessionId;
use super::state::PushState;

/// The session currently occupying a slot
struct ActiveSession<S> {
    id: SessionId,
    source: SourceRef,
    session: S,
    interrupted: bool,
    created_at: Instant,
}

/// A push target and at most one live egress session
pub struct ManagedSource<S: EgressSession> {
    target_url: String,
    slot: Option<ActiveSession<S>>,
    next_id: u64,
}

impl<S: EgressSession> ManagedSource<S> {
    /// Create a managed source with an empty slot
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            slot: None,
            next_id: 1,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Current lifecycle state
    pub fn state(&self) -> PushState {
        match &self.slot {
            None => PushState::Unregistered,
            Some(active) if active.interrupted => PushState::Interrupted,
            Some(_) => PushState::Publishing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    /// Id of the session in the slot
    pub fn session_id(&self) -> Option<SessionId> {
        self.slot.as_ref().map(|active| active.id)
    }

    /// Source the live session is bound to
    pub fn bound_source(&self) -> Option<&SourceRef> {
        self.slot.as_ref().map(|active| &active.source)
    }

    /// Reserve the id for the next session
    pub fn next_session_id(&mut self) -> SessionId {
        let id = SessionId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Put a session into the slot, releasing any previous occupant first
    pub fn install(&mut self, id: SessionId, source: SourceRef, session: S) {
        if let Some(previous) = self.release() {
            tracing::warn!(
                url = %self.target_url,
                replaced = %previous,
                session = %id,
                "Replacing live session"
            );
        }

        self.slot = Some(ActiveSession {
            id,
            source,
            session,
            interrupted: false,
            created_at: Instant::now(),
        });
    }

    /// Flag the live session as stopped. Returns `false` if `id` is not the
    /// live session.
    pub fn mark_interrupted(&mut self, id: SessionId) -> bool {
        match self.slot.as_mut() {
            Some(active) if active.id == id => {
                active.interrupted = true;
                true
            }
            _ => false,
        }
    }

    /// Release the live session and clear the slot.
    ///
    /// Returns the released id, or `None` if the slot was already empty.
    pub fn release(&mut self) -> Option<SessionId> {
        let mut active = self.slot.take()?;
        active.session.release();

        tracing::debug!(
            url = %self.target_url,
            session = %active.id,
            source = %active.source,
            lifetime_ms = active.created_at.elapsed().as_millis() as u64,
            "Session released"
        );

        Some(active.id)
    }
}

impl<S: EgressSession> Drop for ManagedSource<S> {
    fn drop(&mut self) {
        self.release();
    }
}
