use std::cell::Cell;
use std::path::PathBuf;

use moviebarcode_core::error::Result;
use moviebarcode_core::frame::{Frame, SourceInfo};
use moviebarcode_core::io::ser::SER_HEADER_SIZE;
use moviebarcode_core::io::{FrameSource, FrameStream};

/// SER color id for packed 8-bit BGR frames.
pub const SER_COLOR_BGR: i32 = 101;

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 9=BAYER_GRBG, 10=BAYER_GBRG, 11=BAYER_BGGR,
///             100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    // Height
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    // PixelDepth
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    // FrameCount
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&[0u8; 16]);

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete 8-bit BGR SER file from frames.
pub fn build_bgr_ser(width: u32, height: u32, frames: &[Frame]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 8, frames.len(), SER_COLOR_BGR);
    for frame in frames {
        assert_eq!((frame.width(), frame.height()), (width as usize, height as usize));
        buf.extend(frame.data.iter());
    }
    buf
}

/// Write a SER buffer to a temporary `.ser` file and return the temp file handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::Builder::new()
        .suffix(".ser")
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

/// In-memory source. Every `frames()` call replays the same frames; the
/// sampling pass can be made to yield extra frames to simulate a decoder
/// that disagrees with itself.
pub struct VecSource {
    frames: Vec<Frame>,
    extra_on_second_pass: Vec<Frame>,
    passes: Cell<usize>,
    info: SourceInfo,
}

impl VecSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width() as u32, f.height() as u32))
            .unwrap_or((0, 0));
        Self {
            frames,
            extra_on_second_pass: Vec::new(),
            passes: Cell::new(0),
            info: SourceInfo {
                filename: PathBuf::from("memory"),
                width,
                height,
                declared_frames: None,
                backend: "memory",
            },
        }
    }

    pub fn with_extra_on_second_pass(mut self, extra: Vec<Frame>) -> Self {
        self.extra_on_second_pass = extra;
        self
    }

    pub fn passes(&self) -> usize {
        self.passes.get()
    }
}

impl FrameSource for VecSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn frames(&self) -> Result<FrameStream<'_>> {
        let pass = self.passes.get();
        self.passes.set(pass + 1);
        let extra: &[Frame] = if pass >= 1 {
            &self.extra_on_second_pass
        } else {
            &[]
        };
        Ok(Box::new(self.frames.iter().chain(extra).cloned().map(Ok)))
    }
}

/// BGR value of pure red.
pub const RED: [u8; 3] = [0, 0, 255];
/// BGR value of pure blue.
pub const BLUE: [u8; 3] = [255, 0, 0];
/// BGR value of pure green.
pub const GREEN: [u8; 3] = [0, 255, 0];
