use ndarray::{s, Array3, ArrayView3};
use std::path::PathBuf;

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{BarcodeError, Result};

/// A single decoded video frame.
///
/// Pixel data is 8-bit, row-major, shape = (height, width, 3), channels in
/// B, G, R order.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Array3<u8>,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array3<u8>) -> Self {
        Self {
            data,
            metadata: FrameMetadata::default(),
        }
    }

    /// Build a frame from a packed BGR24 buffer.
    pub fn from_bgr24(width: usize, height: usize, bytes: Vec<u8>) -> Result<Self> {
        let data = Array3::from_shape_vec((height, width, COLOR_CHANNEL_COUNT), bytes)
            .map_err(|e| BarcodeError::Decode(format!("bad frame buffer: {e}")))?;
        Ok(Self::new(data))
    }

    /// A frame where every pixel has the same BGR value.
    pub fn solid(width: usize, height: usize, bgr: [u8; 3]) -> Self {
        let mut data = Array3::<u8>::zeros((height, width, COLOR_CHANNEL_COUNT));
        for (c, &v) in bgr.iter().enumerate() {
            data.slice_mut(s![.., .., c]).fill(v);
        }
        Self::new(data)
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Rows `[top, bottom)` across the full width.
    pub fn rows(&self, top: usize, bottom: usize) -> ArrayView3<'_, u8> {
        let bottom = bottom.min(self.height());
        let top = top.min(bottom);
        self.data.slice(s![top..bottom, .., ..])
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
}

/// Channel layout of source pixel data. Mono and Bayer data are both
/// read as a single plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    RGB,
    BGR,
}

/// Metadata about the opened video.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Frame count announced by the container, if any. Never used for sampling.
    pub declared_frames: Option<usize>,
    pub backend: &'static str,
}
