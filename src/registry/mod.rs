//! Source registry and registration notifier
//!
//! The registry tracks which sources are available and under which
//! protocols. Every change is announced on a `tokio::sync::broadcast`
//! channel, and raw frames are fanned out to egress sessions the same way.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<SourceRegistry>
//!                     ┌─────────────────────────┐
//!                     │ sources: HashMap<Key,   │
//!                     │   SourceEntry {         │
//!                     │     schemas,            │
//!                     │     tx: broadcast::Tx,  │
//!                     │   }                     │
//!                     │ >                       │
//!                     │ events: broadcast::Tx   │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [MediaChannel]          [Orchestrator]           [Session]
//!   submit_frame()          events.recv()            frames.recv()
//!         │                       │                       ▲
//!         └──► broadcast_with() ──┼───────────────────────┘
//!                                 └──► create_session()
//! ```
//!
//! # Zero-Copy Fan-Out
//!
//! A frame is copied once into `bytes::Bytes`; every session receives a
//! reference-counted clone. When no session listens the copy is skipped.

pub mod config;
pub mod entry;
pub mod frame;
pub mod source;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{SourceEntry, SourceStats};
pub use frame::RawFrame;
pub use source::{SourceEvent, SourceKey, SourceRef, VideoCodec, VideoInfo};
pub use store::SourceRegistry;
