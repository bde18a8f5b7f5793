//! Raw media for the synthetic source
//!
//! This module provides:
//! - YUV 4:2:0 plane buffers, allocated once and reused
//! - Solid-color generation (random YUV or BT.601-converted RGB)
//! - The borrowed frame type passed to the engine intake

pub mod color;
pub mod frame;
pub mod plane;

pub use color::{ColorGenerator, ColorMode, Rgb, Yuv};
pub use frame::VideoFrame;
pub use plane::{PixelPlane, YuvPlanes};
