//! Planar YUV 4:2:0 buffers
//!
//! Planes are allocated once for the lifetime of a producer and rewritten
//! in place every tick. Only the logical region of each row is written;
//! stride padding is left untouched.

use crate::error::{Error, Result};

use super::color::Yuv;
use super::frame::VideoFrame;

/// One channel of a planar picture
#[derive(Debug)]
pub struct PixelPlane {
    data: Vec<u8>,
    stride: usize,
    width: usize,
    rows: usize,
}

impl PixelPlane {
    /// Reserve a plane of `stride * rows` bytes.
    ///
    /// Fails with [`Error::Allocation`] instead of aborting when the
    /// reservation cannot be satisfied.
    pub fn new(name: &'static str, width: usize, rows: usize, stride: usize) -> Result<Self> {
        let stride = stride.max(width);
        let bytes = stride.checked_mul(rows).ok_or(Error::Allocation {
            plane: name,
            bytes: usize::MAX,
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| Error::Allocation { plane: name, bytes })?;
        data.resize(bytes, 0);

        Ok(Self {
            data,
            stride,
            width,
            rows,
        })
    }

    /// Fill the logical region with a single value
    pub fn fill(&mut self, value: u8) {
        if self.width == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(self.stride).take(self.rows) {
            row[..self.width].fill(value);
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the logical bytes of each row
    pub fn rows_iter(&self) -> impl Iterator<Item = &[u8]> {
        let width = self.width;
        self.data
            .chunks(self.stride.max(1))
            .take(self.rows)
            .map(move |row| &row[..width])
    }
}

fn align_up(value: usize, align: usize) -> usize {
    let align = align.max(1);
    value.div_ceil(align) * align
}

/// The three planes of a YUV 4:2:0 picture
#[derive(Debug)]
pub struct YuvPlanes {
    width: u32,
    height: u32,
    y: PixelPlane,
    u: PixelPlane,
    v: PixelPlane,
}

impl YuvPlanes {
    /// Allocate planes for a `width x height` picture.
    ///
    /// Chroma planes are `width/2 x height/2`, rounded down. Strides are
    /// rounded up to a multiple of `stride_align`.
    pub fn new(width: u32, height: u32, stride_align: usize) -> Result<Self> {
        let luma_w = width as usize;
        let luma_h = height as usize;
        let chroma_w = luma_w / 2;
        let chroma_h = luma_h / 2;

        let y = PixelPlane::new("Y", luma_w, luma_h, align_up(luma_w, stride_align))?;
        let u = PixelPlane::new("U", chroma_w, chroma_h, align_up(chroma_w, stride_align))?;
        let v = PixelPlane::new("V", chroma_w, chroma_h, align_up(chroma_w, stride_align))?;

        Ok(Self {
            width,
            height,
            y,
            u,
            v,
        })
    }

    /// Paint the whole picture with one color
    pub fn fill(&mut self, color: Yuv) {
        self.y.fill(color.y);
        self.u.fill(color.u);
        self.v.fill(color.v);
    }

    /// Borrow the planes as a frame stamped with `timestamp_ms`
    pub fn frame(&self, timestamp_ms: u64) -> VideoFrame<'_> {
        VideoFrame {
            planes: [self.y.data(), self.u.data(), self.v.data()],
            strides: [self.y.stride(), self.u.stride(), self.v.stride()],
            width: self.width,
            height: self.height,
            timestamp_ms,
        }
    }

    pub fn luma(&self) -> &PixelPlane {
        &self.y
    }

    pub fn chroma_u(&self) -> &PixelPlane {
        &self.u
    }

    pub fn chroma_v(&self) -> &PixelPlane {
        &self.v
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
