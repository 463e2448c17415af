use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array3;

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{BarcodeError, Result};
use crate::frame::{ColorMode, Frame, FrameMetadata, SourceInfo};
use crate::io::source::{FrameSource, FrameStream};

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    /// Bytes per pixel plane (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel_plane(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_mode() {
            ColorMode::RGB | ColorMode::BGR => 3,
            ColorMode::Mono => 1,
        }
    }

    /// Total bytes per frame. Fails if the header describes a frame too
    /// large to address.
    pub fn frame_byte_size(&self) -> Result<usize> {
        let bytes_per_pixel = self.bytes_per_pixel_plane() * self.planes_per_pixel();
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
            .ok_or_else(|| {
                BarcodeError::InvalidSer(format!(
                    "Frame size overflows: {}x{} at {} bytes per pixel",
                    self.width, self.height, bytes_per_pixel
                ))
            })
    }

    /// Bayer mosaics are read like mono data, without demosaicing.
    pub fn color_mode(&self) -> ColorMode {
        match self.color_id {
            100 => ColorMode::RGB,
            101 => ColorMode::BGR,
            _ => ColorMode::Mono,
        }
    }
}

/// Memory-mapped SER file reader.
pub struct SerReader {
    mmap: Mmap,
    frame_size: usize,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(BarcodeError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(BarcodeError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let frame_size = header.frame_byte_size()?;

        let expected_data_size = frame_size
            .checked_mul(header.frame_count as usize)
            .and_then(|data| data.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| {
                BarcodeError::InvalidSer(format!(
                    "Data size overflows: {} frames of {} bytes",
                    header.frame_count, frame_size
                ))
            })?;
        if mmap.len() < expected_data_size {
            return Err(BarcodeError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            frame_size,
            header,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(BarcodeError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        // In range: `open` checked that every frame fits inside the file.
        let offset = SER_HEADER_SIZE + index * self.frame_size;
        Ok(&self.mmap[offset..offset + self.frame_size])
    }

    /// Read a single frame as 8-bit BGR.
    ///
    /// Mono and Bayer data is replicated into all three channels; deeper
    /// samples are shifted down to 8 bits.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let bps = self.header.bytes_per_pixel_plane();
        let planes = self.header.planes_per_pixel();

        // Source plane feeding each of the B, G, R output channels.
        let plane_for_channel: [usize; COLOR_CHANNEL_COUNT] = match self.header.color_mode() {
            ColorMode::RGB => [2, 1, 0],
            ColorMode::BGR => [0, 1, 2],
            ColorMode::Mono => [0, 0, 0],
        };

        let mut data = Array3::<u8>::zeros((h, w, COLOR_CHANNEL_COUNT));
        for row in 0..h {
            for col in 0..w {
                let pixel_offset = (row * w + col) * planes * bps;
                for (channel, &plane) in plane_for_channel.iter().enumerate() {
                    let idx = pixel_offset + plane * bps;
                    data[[row, col, channel]] = self.sample_to_u8(raw, idx);
                }
            }
        }

        let mut frame = Frame::new(data);
        frame.metadata = FrameMetadata { frame_index: index };
        Ok(frame)
    }

    fn sample_to_u8(&self, raw: &[u8], idx: usize) -> u8 {
        if self.header.bytes_per_pixel_plane() == 1 {
            return raw[idx];
        }
        let pair = [raw[idx], raw[idx + 1]];
        let val = if self.header.little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        };
        let shift = self.header.pixel_depth.clamp(8, 16) - 8;
        (val >> shift).min(255) as u8
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            width: self.header.width,
            height: self.header.height,
            declared_frames: Some(self.frame_count()),
            backend: "ser",
        }
    }

    /// Iterator over all frames.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }
}

/// `FrameSource` over a SER recording.
pub struct SerSource {
    reader: SerReader,
    info: SourceInfo,
}

impl SerSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = SerReader::open(path)
            .map_err(|e| BarcodeError::Open(format!("{}: {e}", path.display())))?;
        let info = reader.source_info(path);
        Ok(Self { reader, info })
    }
}

impl FrameSource for SerSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn frames(&self) -> Result<FrameStream<'_>> {
        Ok(Box::new(self.reader.frames()))
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(BarcodeError::InvalidDimensions {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        });
    }
    if pixel_depth <= 0 || frame_count < 0 {
        return Err(BarcodeError::InvalidSer(format!(
            "Bad header fields: pixel depth {pixel_depth}, frame count {frame_count}"
        )));
    }

    // LittleEndian = 0 is little-endian in practice (Siril convention).
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
    })
}
