//! Push-lifecycle orchestrator
//!
//! Keeps exactly one egress session alive for a managed source while, and
//! only while, the engine reports that source as registered.
//!
//! All state changes go through [`PushOrchestrator::handle_event`]. The
//! orchestrator runs as a single actor task, so registration notifications
//! and session reports are applied one at a time and never race on the
//! session slot.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::engine::{EgressSession, PushEngine, SessionReporter};
use crate::error::{Error, Result};
use crate::registry::{SourceEvent, SourceKey, SourceRef};
use crate::scheme;
use crate::stats::PushStats;

use super::event::{PushEvent, SessionId};
use super::source::ManagedSource;
use super::state::PushState;

/// Sends events into a running orchestrator
#[derive(Debug, Clone)]
pub struct PushHandle {
    tx: mpsc::UnboundedSender<PushEvent>,
}

impl PushHandle {
    /// Queue an event
    pub fn send(&self, event: PushEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| Error::ChannelClosed)
    }

    /// Queue a registration change
    pub fn source_changed(&self, source: SourceRef, registered: bool) -> Result<()> {
        self.send(PushEvent::source_changed(source, registered))
    }
}

/// Orchestrates the egress session of one managed source
pub struct PushOrchestrator<E: PushEngine> {
    engine: Arc<E>,
    source: ManagedSource<E::Session>,
    watch: Option<SourceKey>,
    events_tx: mpsc::UnboundedSender<PushEvent>,
    events_rx: mpsc::UnboundedReceiver<PushEvent>,
    stats: PushStats,
}

impl<E: PushEngine> PushOrchestrator<E> {
    /// Create an orchestrator publishing to `target_url`
    pub fn new(engine: Arc<E>, target_url: impl Into<String>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            engine,
            source: ManagedSource::new(target_url),
            watch: None,
            events_tx,
            events_rx,
            stats: PushStats::default(),
        }
    }

    /// Only react to registrations of `key`
    ///
    /// Without a watch, any source whose schema matches the target URL is
    /// accepted.
    pub fn watch(mut self, key: SourceKey) -> Self {
        self.watch = Some(key);
        self
    }

    /// Handle for queueing events from other tasks
    pub fn handle(&self) -> PushHandle {
        PushHandle {
            tx: self.events_tx.clone(),
        }
    }

    pub fn target_url(&self) -> &str {
        self.source.target_url()
    }

    pub fn state(&self) -> PushState {
        self.source.state()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.source.session_id()
    }

    pub fn managed_source(&self) -> &ManagedSource<E::Session> {
        &self.source
    }

    pub fn stats(&self) -> &PushStats {
        &self.stats
    }

    /// Apply one event
    pub fn handle_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::SourceChanged(SourceEvent { source, registered }) => {
                self.on_registration_changed(&source, registered)
            }
            PushEvent::PublishResult {
                session,
                code,
                message,
            } => self.on_publish_result(session, code, &message),
            PushEvent::Shutdown {
                session,
                code,
                message,
            } => self.on_shutdown(session, code, &message),
        }
    }

    /// Apply every event already queued in the mailbox
    ///
    /// Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// React to a source becoming available or unavailable
    pub fn on_registration_changed(&mut self, source: &SourceRef, registered: bool) {
        if !scheme::matches_target(self.source.target_url(), &source.schema) {
            tracing::debug!(
                source = %source,
                url = %self.source.target_url(),
                "Ignoring registration for other protocol"
            );
            self.stats.ignored_events += 1;
            return;
        }
        if self.watch.as_ref().is_some_and(|key| *key != source.key) {
            tracing::debug!(source = %source, "Ignoring registration for unwatched source");
            self.stats.ignored_events += 1;
            return;
        }

        if !registered && self.is_bound_elsewhere(source) {
            tracing::debug!(
                source = %source,
                bound = ?self.source.bound_source(),
                "Ignoring unregistration of unbound source"
            );
            self.stats.ignored_events += 1;
            return;
        }

        if self.source.state() == PushState::Interrupted {
            tracing::info!(
                url = %self.source.target_url(),
                registered = registered,
                "Reconciling interrupted session"
            );
            self.release_session();
        }

        if !registered {
            self.release_session();
            return;
        }

        if self.source.is_active() {
            tracing::debug!(
                source = %source,
                session = ?self.source.session_id(),
                "Already publishing"
            );
            return;
        }

        self.create_session(source);
    }

    /// Record the outcome of the initial publish
    ///
    /// Never changes state: a failed publish keeps its slot until the
    /// source is unregistered.
    pub fn on_publish_result(&mut self, session: SessionId, code: i32, message: &str) {
        if self.is_stale(session) {
            return;
        }

        if code == 0 {
            self.stats.publish_successes += 1;
            tracing::info!(
                url = %self.source.target_url(),
                session = %session,
                "Publish succeeded"
            );
        } else {
            self.stats.publish_failures += 1;
            tracing::warn!(
                url = %self.source.target_url(),
                session = %session,
                code = code,
                error = %message,
                "Publish failed"
            );
        }
    }

    /// Record that a published session stopped
    ///
    /// The session is not released here; the next registration event for
    /// this source reconciles the slot.
    pub fn on_shutdown(&mut self, session: SessionId, code: i32, message: &str) {
        if self.is_stale(session) {
            return;
        }

        self.source.mark_interrupted(session);
        self.stats.interruptions += 1;

        tracing::warn!(
            url = %self.source.target_url(),
            session = %session,
            code = code,
            error = %message,
            "Push interrupted"
        );
    }

    /// Release the live session, if any. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.release_session();
    }

    /// Run as an actor until `shutdown` resolves or the notifier closes
    ///
    /// Registration notifications and session reports are handled on this
    /// task only. The live session is released before returning.
    pub async fn run_until<F>(
        mut self,
        mut notifications: broadcast::Receiver<SourceEvent>,
        shutdown: F,
    ) -> PushStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(url = %self.source.target_url(), "Push orchestrator started");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                result = notifications.recv() => match result {
                    Ok(event) => self.handle_event(PushEvent::SourceChanged(event)),
                    Err(RecvError::Lagged(missed)) => self.on_notifications_lagged(missed),
                    Err(RecvError::Closed) => {
                        tracing::info!("Registration notifier closed");
                        break;
                    }
                },
            }
        }

        self.shutdown();
        tracing::info!(stats = ?self.stats, "Push orchestrator stopped");
        self.stats.clone()
    }

    /// Notifications were dropped before this task could read them
    ///
    /// A lost unregistration may have left a dead session in the slot, so
    /// the slot is flagged for reconciliation on the next matching event.
    fn on_notifications_lagged(&mut self, missed: u64) {
        self.stats.lagged_notifications += missed;

        tracing::warn!(
            url = %self.source.target_url(),
            missed = missed,
            state = %self.source.state(),
            session = ?self.source.session_id(),
            "Registration notifications lagged"
        );

        if let Some(id) = self.source.session_id() {
            self.source.mark_interrupted(id);
        }
    }

    fn is_bound_elsewhere(&self, source: &SourceRef) -> bool {
        self.source
            .bound_source()
            .is_some_and(|bound| bound.key != source.key)
    }

    fn create_session(&mut self, source: &SourceRef) {
        let id = self.source.next_session_id();
        let reporter = SessionReporter::new(id, self.events_tx.clone());

        let mut session = match self.engine.create_session(source, reporter) {
            Ok(session) => session,
            Err(e) => {
                self.stats.create_failures += 1;
                tracing::warn!(source = %source, error = %e, "Failed to create push session");
                return;
            }
        };

        let url = self.source.target_url().to_string();
        session.publish(&url);
        self.source.install(id, source.clone(), session);
        self.stats.sessions_created += 1;

        tracing::info!(source = %source, url = %url, session = %id, "Push session created");
    }

    fn release_session(&mut self) {
        if let Some(id) = self.source.release() {
            self.stats.sessions_released += 1;
            tracing::info!(url = %self.source.target_url(), session = %id, "Push stopped");
        }
    }

    fn is_stale(&mut self, session: SessionId) -> bool {
        if self.source.session_id() == Some(session) {
            return false;
        }
        self.stats.stale_events += 1;
        tracing::debug!(session = %session, "Ignoring report from released session");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::{LocalEngine, MediaIntake, VideoInfo};
    use crate::media::{Yuv, YuvPlanes};
    use crate::testing::RecordingEngine;

    const TARGET: &str = "rtsp://host/live/test";

    fn key() -> SourceKey {
        SourceKey::new("__defaultVhost__", "live", "test")
    }

    fn rtsp() -> SourceRef {
        SourceRef::new("rtsp", key())
    }

    fn rtmp() -> SourceRef {
        SourceRef::new("rtmp", key())
    }

    fn orchestrator() -> (PushOrchestrator<RecordingEngine>, Arc<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine::new());
        (PushOrchestrator::new(Arc::clone(&engine), TARGET), engine)
    }

    #[test]
    fn test_registration_creates_and_publishes() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);

        assert_eq!(engine.created_count(), 1);
        assert_eq!(engine.source(0), rtsp());
        assert_eq!(engine.tracker(0).published(), vec![TARGET.to_string()]);
        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(orch.stats().sessions_created, 1);
    }

    #[test]
    fn test_unregistration_releases_and_clears() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        orch.on_registration_changed(&rtsp(), false);

        assert_eq!(engine.tracker(0).release_count(), 1);
        assert_eq!(orch.state(), PushState::Unregistered);
        assert!(orch.session_id().is_none());
        assert_eq!(orch.stats().sessions_released, 1);
    }

    #[test]
    fn test_other_protocol_is_ignored() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtmp(), true);

        assert_eq!(engine.created_count(), 0);
        assert_eq!(orch.state(), PushState::Unregistered);
        assert_eq!(orch.stats().ignored_events, 1);
    }

    #[test]
    fn test_other_protocol_unregister_keeps_session() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        orch.on_registration_changed(&rtmp(), false);

        assert_eq!(engine.tracker(0).release_count(), 0);
        assert_eq!(orch.state(), PushState::Publishing);
    }

    #[test]
    fn test_unregister_of_unbound_source_keeps_session() {
        let (mut orch, engine) = orchestrator();
        let other = SourceRef::new("rtsp", SourceKey::new("__defaultVhost__", "live", "other"));

        orch.on_registration_changed(&rtsp(), true);
        orch.on_registration_changed(&other, false);

        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(engine.tracker(0).release_count(), 0);
        assert_eq!(orch.stats().ignored_events, 1);

        orch.on_registration_changed(&rtsp(), false);
        assert_eq!(orch.state(), PushState::Unregistered);
        assert_eq!(engine.tracker(0).release_count(), 1);
    }

    #[test]
    fn test_registration_from_plain_thread_without_runtime() {
        let engine = Arc::new(LocalEngine::new(vec!["rtsp".to_string()]));
        let mut orch = PushOrchestrator::new(Arc::clone(&engine), TARGET);
        let media = engine.create_media(key(), VideoInfo::new(16, 16, 25.0));
        media.init_complete();

        orch.on_registration_changed(&rtsp(), true);
        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(orch.process_pending(), 1);
        assert_eq!(orch.stats().publish_failures, 1);

        media.release();
        orch.on_registration_changed(&rtsp(), false);
        assert_eq!(orch.state(), PushState::Unregistered);
    }

    #[test]
    fn test_duplicate_registration_creates_one_session() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        let first = orch.session_id();
        orch.on_registration_changed(&rtsp(), true);

        assert_eq!(engine.created_count(), 1);
        assert_eq!(orch.session_id(), first);
    }

    #[test]
    fn test_unregister_without_session_is_noop() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), false);
        orch.on_registration_changed(&rtsp(), false);
        orch.shutdown();

        assert_eq!(engine.created_count(), 0);
        assert_eq!(orch.state(), PushState::Unregistered);
        assert_eq!(orch.stats().sessions_released, 0);
    }

    #[test]
    fn test_repeated_cycles_release_every_session_once() {
        let (mut orch, engine) = orchestrator();

        for _ in 0..5 {
            orch.on_registration_changed(&rtsp(), true);
            orch.on_registration_changed(&rtsp(), false);
        }

        assert_eq!(engine.created_count(), 5);
        for i in 0..5 {
            assert_eq!(engine.tracker(i).release_count(), 1);
        }
        assert_eq!(orch.stats().sessions_created, 5);
        assert_eq!(orch.stats().sessions_released, 5);
    }

    #[test]
    fn test_publish_failure_keeps_session() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        engine.reporter(0).on_result(-1, "connection refused");
        assert_eq!(orch.process_pending(), 1);

        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(engine.tracker(0).release_count(), 0);
        assert_eq!(orch.stats().publish_failures, 1);
    }

    #[test]
    fn test_publish_success_is_counted() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        engine.reporter(0).on_result(0, "");
        orch.process_pending();

        assert_eq!(orch.stats().publish_successes, 1);
        assert_eq!(orch.state(), PushState::Publishing);
    }

    #[test]
    fn test_shutdown_defers_release_to_next_registration() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        engine.reporter(0).on_shutdown(-2, "peer closed");
        orch.process_pending();

        assert_eq!(orch.state(), PushState::Interrupted);
        assert_eq!(engine.tracker(0).release_count(), 0);

        // Next registration releases the dead session and starts over
        orch.on_registration_changed(&rtsp(), true);

        assert_eq!(engine.tracker(0).release_count(), 1);
        assert_eq!(engine.created_count(), 2);
        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(orch.stats().interruptions, 1);
    }

    #[test]
    fn test_shutdown_then_unregister_clears() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        engine.reporter(0).on_shutdown(-2, "peer closed");
        orch.process_pending();
        orch.on_registration_changed(&rtsp(), false);

        assert_eq!(engine.tracker(0).release_count(), 1);
        assert_eq!(engine.created_count(), 1);
        assert_eq!(orch.state(), PushState::Unregistered);
    }

    #[test]
    fn test_reports_from_released_session_are_stale() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        orch.on_registration_changed(&rtsp(), false);
        orch.on_registration_changed(&rtsp(), true);

        engine.reporter(0).on_shutdown(-2, "late");
        engine.reporter(0).on_result(-1, "late");
        orch.process_pending();

        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(orch.stats().stale_events, 2);
        assert_eq!(orch.stats().interruptions, 0);
    }

    #[test]
    fn test_creation_failure_is_recoverable() {
        let (mut orch, engine) = orchestrator();

        engine.fail_creation(true);
        orch.on_registration_changed(&rtsp(), true);
        assert_eq!(orch.state(), PushState::Unregistered);
        assert_eq!(orch.stats().create_failures, 1);

        engine.fail_creation(false);
        orch.on_registration_changed(&rtsp(), true);
        assert_eq!(orch.state(), PushState::Publishing);
    }

    #[test]
    fn test_watch_filters_other_sources() {
        let engine = Arc::new(RecordingEngine::new());
        let mut orch = PushOrchestrator::new(Arc::clone(&engine), TARGET).watch(key());

        let other = SourceRef::new("rtsp", SourceKey::new("__defaultVhost__", "live", "other"));
        orch.on_registration_changed(&other, true);
        assert_eq!(engine.created_count(), 0);

        orch.on_registration_changed(&rtsp(), true);
        orch.on_registration_changed(&other, false);
        assert_eq!(orch.state(), PushState::Publishing);
    }

    #[test]
    fn test_drop_releases_live_session() {
        let (mut orch, engine) = orchestrator();

        orch.on_registration_changed(&rtsp(), true);
        drop(orch);

        assert_eq!(engine.tracker(0).release_count(), 1);
    }

    #[test]
    fn test_handle_queues_events() {
        let (mut orch, engine) = orchestrator();
        let handle = orch.handle();

        handle.source_changed(rtsp(), true).unwrap();
        handle.source_changed(rtmp(), true).unwrap();
        assert_eq!(orch.process_pending(), 2);

        assert_eq!(engine.created_count(), 1);
    }

    #[tokio::test]
    async fn test_run_until_releases_on_shutdown() {
        let (orch, engine) = orchestrator();
        let (tx, rx) = broadcast::channel(8);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(orch.run_until(rx, async move {
            let _ = stop_rx.await;
        }));

        tx.send(SourceEvent::registered(rtsp())).unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while engine.created_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        stop_tx.send(()).unwrap();
        let stats = task.await.unwrap();

        assert_eq!(stats.sessions_created, 1);
        assert_eq!(stats.sessions_released, 1);
        assert_eq!(engine.tracker(0).release_count(), 1);
    }

    #[tokio::test]
    async fn test_lagged_notifications_force_reconciliation() {
        let (orch, engine) = orchestrator();
        let (tx, rx) = broadcast::channel(2);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let other = SourceRef::new("rtsp", SourceKey::new("__defaultVhost__", "live", "other"));

        let task = tokio::spawn(orch.run_until(rx, async move {
            let _ = stop_rx.await;
        }));

        tx.send(SourceEvent::registered(rtsp())).unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while engine.created_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // Overflow the channel while the actor is not running
        tx.send(SourceEvent::unregistered(other.clone())).unwrap();
        tx.send(SourceEvent::unregistered(other)).unwrap();
        tx.send(SourceEvent::registered(rtsp())).unwrap();
        tx.send(SourceEvent::registered(rtsp())).unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while engine.created_count() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        stop_tx.send(()).unwrap();
        let stats = task.await.unwrap();

        assert_eq!(stats.lagged_notifications, 2);
        assert_eq!(stats.sessions_created, 2);
        assert_eq!(engine.tracker(0).release_count(), 1);
        assert_eq!(engine.tracker(1).release_count(), 1);
    }

    #[tokio::test]
    async fn test_run_until_stops_when_notifier_closes() {
        let (orch, _engine) = orchestrator();
        let (tx, rx) = broadcast::channel::<SourceEvent>(8);
        drop(tx);

        let stats = tokio::time::timeout(
            Duration::from_secs(1),
            orch.run_until(rx, std::future::pending()),
        )
        .await
        .unwrap();

        assert_eq!(stats.sessions_created, 0);
    }

    #[tokio::test]
    async fn test_local_engine_end_to_end() {
        let engine = Arc::new(LocalEngine::new(vec!["rtsp".to_string(), "rtmp".to_string()]));
        let mut orch = PushOrchestrator::new(Arc::clone(&engine), TARGET);
        let mut notifications = engine.subscribe();

        let media = engine.create_media(key(), VideoInfo::new(16, 16, 25.0));
        media.init_complete();

        // rtsp registers, rtmp is ignored
        for _ in 0..2 {
            let event = notifications.recv().await.unwrap();
            orch.handle_event(event.into());
        }
        assert_eq!(orch.state(), PushState::Publishing);
        assert_eq!(orch.stats().ignored_events, 1);

        let mut planes = YuvPlanes::new(16, 16, 1).unwrap();
        planes.fill(Yuv::new(16, 128, 128));
        media.submit_frame(&planes.frame(0));

        tokio::time::timeout(Duration::from_secs(1), async {
            while orch.stats().publish_successes == 0 {
                orch.process_pending();
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        media.release();
        for _ in 0..2 {
            let event = notifications.recv().await.unwrap();
            orch.handle_event(event.into());
        }
        assert_eq!(orch.state(), PushState::Unregistered);
        assert_eq!(orch.stats().sessions_released, 1);

        // The released session's shutdown report, if any, is stale
        tokio::task::yield_now().await;
        orch.process_pending();
        assert_eq!(orch.stats().interruptions, 0);
    }
}
