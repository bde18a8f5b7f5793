//! Borrowed video frame handed to the engine intake

/// One raw YUV 4:2:0 picture
///
/// Borrows the producer's planes for the duration of a single intake call.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    /// Y, U and V planes
    pub planes: [&'a [u8]; 3],
    /// Row stride of each plane in bytes
    pub strides: [usize; 3],
    /// Logical picture width
    pub width: u32,
    /// Logical picture height
    pub height: u32,
    /// Presentation timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl VideoFrame<'_> {
    /// Total size of all planes in bytes
    pub fn size(&self) -> usize {
        self.planes.iter().map(|p| p.len()).sum()
    }

    /// Check that every plane holds `stride * rows` bytes for 4:2:0
    pub fn is_well_formed(&self) -> bool {
        let luma_rows = self.height as usize;
        let chroma_rows = luma_rows / 2;
        let rows = [luma_rows, chroma_rows, chroma_rows];

        self.planes
            .iter()
            .zip(self.strides.iter())
            .zip(rows.iter())
            .all(|((plane, stride), rows)| plane.len() >= stride * rows)
    }
}
