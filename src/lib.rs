//! # yuv-pusher
//!
//! Drives a live-streaming engine with a synthetic video source and keeps
//! one egress push session alive while that source is registered.
//!
//! Two independent tasks share nothing but the engine:
//!
//! - [`FrameProducer`] fills reusable YUV 4:2:0 planes with a solid color
//!   and submits them to a [`MediaIntake`] at a fixed frame rate.
//! - [`PushOrchestrator`] listens for source registration changes and
//!   creates or releases exactly one [`EgressSession`] per transition.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use yuv_pusher::engine::{LocalEngine, VideoInfo};
//! use yuv_pusher::{FrameProducer, PushConfig, PushOrchestrator};
//!
//! # async fn example() -> yuv_pusher::Result<()> {
//! let config = PushConfig::new("rtsp://127.0.0.1/live/test");
//! let engine = Arc::new(LocalEngine::from_config(&config));
//!
//! let orchestrator = PushOrchestrator::new(Arc::clone(&engine), &config.target_url);
//! let push = tokio::spawn(orchestrator.run_until(engine.subscribe(), async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }));
//!
//! let media = Arc::new(engine.create_media(config.source_key(), VideoInfo::from(&config)));
//! media.init_complete();
//!
//! let producer = FrameProducer::new(&config, Arc::clone(&media))?;
//! producer
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//!
//! media.release();
//! let _ = push.await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod producer;
pub mod push;
pub mod registry;
pub mod scheme;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PushConfig;
pub use engine::{EgressSession, MediaIntake, PushEngine};
pub use error::{Error, Result};
pub use media::{ColorMode, VideoFrame};
pub use producer::FrameProducer;
pub use push::{PushEvent, PushOrchestrator, PushState};
