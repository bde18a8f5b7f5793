//! Raw frames fanned out to egress sessions

use bytes::{BufMut, Bytes, BytesMut};

use crate::media::VideoFrame;

/// A raw picture forwarded to sessions
///
/// Cheap to clone: the planes are copied once into a reference-counted
/// `Bytes` and shared by every receiver.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Presentation timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Y, U and V planes, concatenated
    pub data: Bytes,
    /// Row stride of each plane
    pub strides: [usize; 3],
}

impl RawFrame {
    /// Copy a borrowed frame into an owned one
    pub fn from_video_frame(frame: &VideoFrame<'_>) -> Self {
        let mut data = BytesMut::with_capacity(frame.size());
        for plane in frame.planes {
            data.put_slice(plane);
        }

        Self {
            timestamp_ms: frame.timestamp_ms,
            data: data.freeze(),
            strides: frame.strides,
        }
    }
}
