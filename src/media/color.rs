//! Solid-color generation for synthetic frames
//!
//! Every frame is a single uniform color. Two policies are supported:
//! independent random Y/U/V components, or a random RGB triple converted
//! with the BT.601 matrix.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A YUV color (one value per plane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Yuv {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl Yuv {
    pub fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to YUV using BT.601 coefficients.
    ///
    /// ```text
    /// Y =  0.299R + 0.587G + 0.114B
    /// U = -0.169R - 0.331G + 0.5B   + 128
    /// V =  0.5R   - 0.419G - 0.081B + 128
    /// ```
    ///
    /// Each component is rounded to nearest and clamped to `0..=255`.
    pub fn to_yuv(self) -> Yuv {
        let r = f64::from(self.r);
        let g = f64::from(self.g);
        let b = f64::from(self.b);

        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let u = -0.169 * r - 0.331 * g + 0.5 * b + 128.0;
        let v = 0.5 * r - 0.419 * g - 0.081 * b + 128.0;

        Yuv::new(to_u8(y), to_u8(u), to_u8(v))
    }
}

fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Color generation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Three independent random 8-bit Y/U/V values
    #[default]
    RandomYuv,
    /// Random RGB triple converted with BT.601
    RandomRgb,
}

/// Produces one color per frame
#[derive(Debug)]
pub struct ColorGenerator {
    mode: ColorMode,
    rng: StdRng,
}

impl ColorGenerator {
    /// Create a generator seeded from system entropy
    pub fn new(mode: ColorMode) -> Self {
        Self {
            mode,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible generator
    pub fn with_seed(mode: ColorMode, seed: u64) -> Self {
        Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Pick the color for the next frame
    pub fn next_color(&mut self) -> Yuv {
        match self.mode {
            ColorMode::RandomYuv => Yuv::new(self.rng.gen(), self.rng.gen(), self.rng.gen()),
            ColorMode::RandomRgb => {
                Rgb::new(self.rng.gen(), self.rng.gen(), self.rng.gen()).to_yuv()
            }
        }
    }
}
