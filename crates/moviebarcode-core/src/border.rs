//! Letterbox detection.
//!
//! Walks down three fixed columns (near-left, center, right edge) of the first
//! channel until any of them reaches the darkness threshold. Assumes the bars
//! are uniformly dark and symmetric top/bottom; noisy or colored bars are not
//! recognized.

use tracing::warn;

use crate::consts::BORDER_DARKNESS_THRESHOLD;
use crate::error::{BarcodeError, Result};
use crate::frame::Frame;

/// Border measured once on a probe frame and reused for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderGeometry {
    pub frame_height: usize,
    pub frame_width: usize,
    /// Rows stripped from the top, and the same number from the bottom.
    pub border_height: usize,
}

impl BorderGeometry {
    pub fn measure(frame: &Frame, threshold: u8) -> Result<Self> {
        Ok(Self {
            frame_height: frame.height(),
            frame_width: frame.width(),
            border_height: detect_border_height_with(frame, threshold)?,
        })
    }

    /// Row range `[top, bottom)` kept after stripping both bars.
    pub fn content_rows(&self) -> (usize, usize) {
        (self.border_height, self.frame_height - self.border_height)
    }
}

/// Height of the dark band at the top of `frame`, using the default threshold.
pub fn detect_border_height(frame: &Frame) -> Result<usize> {
    detect_border_height_with(frame, BORDER_DARKNESS_THRESHOLD)
}

/// Height of the dark band at the top of `frame`.
///
/// Returns the index of the first row where any probe column reaches
/// `threshold`. A frame that is dark all the way down, or whose band would
/// swallow every row once mirrored at the bottom, yields 0.
pub fn detect_border_height_with(frame: &Frame, threshold: u8) -> Result<usize> {
    let (height, width) = (frame.height(), frame.width());
    if height == 0 || width == 0 {
        return Err(BarcodeError::Decode(format!(
            "degenerate frame {width}x{height}"
        )));
    }

    let columns = [1.min(width - 1), width / 2, width - 1];
    let is_dark = |row: usize| {
        columns
            .iter()
            .all(|&col| frame.data[[row, col, 0]] < threshold)
    };

    let Some(border) = (0..height).find(|&row| !is_dark(row)) else {
        warn!(height, "Probe frame is dark from top to bottom, keeping all rows");
        return Ok(0);
    };

    if border * 2 >= height {
        warn!(border, height, "Border would leave no content, keeping all rows");
        return Ok(0);
    }

    Ok(border)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn letterboxed(width: usize, height: usize, bar: usize) -> Frame {
        let mut frame = Frame::solid(width, height, [200, 120, 40]);
        frame.data.slice_mut(s![..bar, .., ..]).fill(0);
        frame.data.slice_mut(s![height - bar.., .., ..]).fill(0);
        frame
    }

    #[test]
    fn test_no_border() {
        let frame = Frame::solid(16, 9, [200, 200, 200]);
        assert_eq!(detect_border_height(&frame).unwrap(), 0);
    }

    #[test]
    fn test_letterbox_detected() {
        let frame = letterboxed(32, 24, 4);
        assert_eq!(detect_border_height(&frame).unwrap(), 4);
    }

    #[test]
    fn test_single_bright_probe_column_ends_border() {
        let mut frame = letterboxed(32, 24, 6);
        // A bright pixel in the center column only.
        frame.data[[2, 16, 0]] = 255;
        assert_eq!(detect_border_height(&frame).unwrap(), 2);
    }

    #[test]
    fn test_only_first_channel_is_inspected() {
        let mut frame = letterboxed(32, 24, 5);
        // Bright green/red inside the bar does not count.
        frame.data.slice_mut(s![..5, .., 1..]).fill(255);
        assert_eq!(detect_border_height(&frame).unwrap(), 5);
    }

    #[test]
    fn test_value_at_threshold_is_not_dark() {
        let frame = Frame::solid(8, 8, [BORDER_DARKNESS_THRESHOLD, 0, 0]);
        assert_eq!(detect_border_height(&frame).unwrap(), 0);
    }

    #[test]
    fn test_all_dark_frame() {
        let frame = Frame::solid(8, 8, [3, 3, 3]);
        assert_eq!(detect_border_height(&frame).unwrap(), 0);
    }

    #[test]
    fn test_single_column_frame() {
        let frame = letterboxed(1, 10, 2);
        assert_eq!(detect_border_height(&frame).unwrap(), 2);
    }

    #[test]
    fn test_zero_width_is_decode_error() {
        let frame = Frame::solid(0, 10, [0, 0, 0]);
        assert!(matches!(
            detect_border_height(&frame),
            Err(BarcodeError::Decode(_))
        ));
    }

    #[test]
    fn test_repeated_detection_is_stable() {
        let letterbox = letterboxed(32, 24, 4);
        let dark = Frame::solid(32, 24, [2, 2, 2]);
        for frame in [&letterbox, &dark] {
            let first = detect_border_height(frame).unwrap();
            for _ in 0..5 {
                assert_eq!(detect_border_height(frame).unwrap(), first);
            }
        }
        assert_eq!(detect_border_height(&letterbox).unwrap(), 4);
        assert_eq!(detect_border_height(&dark).unwrap(), 0);
    }

    #[test]
    fn test_geometry_content_rows() {
        let frame = letterboxed(20, 30, 5);
        let geometry = BorderGeometry::measure(&frame, BORDER_DARKNESS_THRESHOLD).unwrap();
        assert_eq!(geometry.content_rows(), (5, 25));
        assert_eq!(geometry.frame_width, 20);
    }
}
