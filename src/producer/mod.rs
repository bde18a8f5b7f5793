//! Synthetic frame producer
//!
//! Emits one solid-color YUV 4:2:0 picture per tick into a [`MediaIntake`]
//! at a fixed frame rate:
//!
//! ```text
//! loop {
//!     color  = next_color()
//!     planes.fill(color)                 // reused buffers, no realloc
//!     intake.submit_frame(planes, pts)   // fire-and-forget
//!     sleep(1000 / fps ms)               // only suspension point
//!     pts += 1000 / fps
//! }
//! ```
//!
//! The loop runs until its shutdown future resolves. A stopped producer is
//! consumed and cannot be restarted.
//!
//! [`MediaIntake`]: crate::engine::MediaIntake

pub mod frame_producer;

pub use frame_producer::FrameProducer;
