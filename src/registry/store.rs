//! Source registry implementation
//!
//! The central registry that tracks available sources, announces
//! registration changes and routes raw frames to egress sessions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::error::{Error, Result};

use super::config::RegistryConfig;
use super::entry::{SourceEntry, SourceStats};
use super::frame::RawFrame;
use super::source::{SourceEvent, SourceKey, SourceRef, VideoInfo};

/// Central registry for all available sources
///
/// Thread-safe via `RwLock`. Frame routing only takes the read lock, so the
/// intake never contends with other submissions.
pub struct SourceRegistry {
    /// Map of source key to source entry
    sources: RwLock<HashMap<SourceKey, Arc<SourceEntry>>>,

    /// Registration notifications
    events: broadcast::Sender<SourceEvent>,

    /// Configuration
    config: RegistryConfig,
}

impl SourceRegistry {
    /// Create a new source registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new source registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);

        Self {
            sources: RwLock::new(HashMap::new()),
            events,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Subscribe to registration notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<SourceEvent> {
        self.events.subscribe()
    }

    /// Register a source under each of `schemas`
    ///
    /// Emits one `registered = true` notification per schema. Registering a
    /// key that is already present is a no-op and returns `false`.
    pub fn register(&self, key: &SourceKey, schemas: &[String], video: VideoInfo) -> bool {
        {
            let mut sources = self.sources.write();
            if sources.contains_key(key) {
                tracing::debug!(source = %key, "Source already registered");
                return false;
            }

            let entry = SourceEntry::new(schemas.to_vec(), video, self.config.frame_capacity);
            sources.insert(key.clone(), Arc::new(entry));
        }

        tracing::info!(source = %key, schemas = ?schemas, "Source registered");

        for schema in schemas {
            self.notify(SourceEvent::registered(SourceRef::new(schema, key.clone())));
        }

        true
    }

    /// Unregister a source
    ///
    /// Emits one `registered = false` notification per schema, then drops
    /// the frame channel so consuming sessions observe its closure.
    /// Returns `false` if the key was not registered.
    pub fn unregister(&self, key: &SourceKey) -> bool {
        let Some(entry) = self.sources.write().remove(key) else {
            return false;
        };

        tracing::info!(
            source = %key,
            receivers = entry.receiver_count(),
            "Source unregistered"
        );

        for schema in &entry.schemas {
            self.notify(SourceEvent::unregistered(SourceRef::new(schema, key.clone())));
        }

        true
    }

    /// Subscribe to a source's frames
    pub fn subscribe_frames(&self, key: &SourceKey) -> Result<broadcast::Receiver<RawFrame>> {
        let sources = self.sources.read();

        let entry = sources
            .get(key)
            .ok_or_else(|| Error::SourceNotFound(key.clone()))?;

        Ok(entry.subscribe())
    }

    /// Route a frame to the sessions of a source
    ///
    /// `make` is only called when at least one session is listening.
    /// Returns `None` if the source is not registered.
    pub fn broadcast_with(
        &self,
        key: &SourceKey,
        make: impl FnOnce() -> RawFrame,
    ) -> Option<usize> {
        let sources = self.sources.read();
        sources.get(key).map(|entry| entry.send_with(make))
    }

    /// Check if a source is registered
    pub fn is_registered(&self, key: &SourceKey) -> bool {
        self.sources.read().contains_key(key)
    }

    /// Get source statistics
    pub fn get_source_stats(&self, key: &SourceKey) -> Option<SourceStats> {
        self.sources.read().get(key).map(|entry| entry.stats())
    }

    /// Get total number of sources
    pub fn source_count(&self) -> usize {
        self.sources.read().len()
    }

    fn notify(&self, event: SourceEvent) {
        // No subscribers is not an error: nobody is waiting for this source
        if self.events.send(event).is_err() {
            tracing::debug!("No registration listeners");
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
