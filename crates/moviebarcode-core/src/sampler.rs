//! Frame-to-column sampling.
//!
//! One output column stands for `stride = ceil(frames / width)` source frames.
//! The video is decoded twice: once to count frames, once to sample them.
//! The border is measured a single time, on the frame just before the first
//! sampled one (or on the first sampled frame when every frame is sampled),
//! and reused for the rest of the run.

use tracing::{debug, info, warn};

use crate::border::BorderGeometry;
use crate::color::{dominant_color, DominantColor, KMeansParams};
use crate::consts::{BORDER_DARKNESS_THRESHOLD, DEFAULT_OUTPUT_WIDTH};
use crate::error::{BarcodeError, Result};
use crate::io::source::FrameSource;
use crate::pipeline::{PipelineStage, ProgressReporter};
use crate::profile::Profiler;

/// Number of source frames folded into one column.
///
/// A video without frames has no stride and fails with `Open`.
pub fn sampling_stride(frame_count: usize, output_width: usize) -> Result<usize> {
    if output_width == 0 {
        return Err(BarcodeError::Config("output width must be > 0".into()));
    }
    if frame_count == 0 {
        return Err(BarcodeError::Open("video has no decodable frames".into()));
    }
    Ok(frame_count.div_ceil(output_width))
}

/// 1-based frame counter at which the border is measured.
pub fn border_probe_counter(stride: usize) -> usize {
    stride.saturating_sub(1).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Counting,
    StreamOpen,
    Sampling,
    Done,
}

#[derive(Clone, Debug)]
pub struct SamplerSettings {
    pub output_width: usize,
    pub border_threshold: u8,
    pub kmeans: KMeansParams,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            output_width: DEFAULT_OUTPUT_WIDTH as usize,
            border_threshold: BORDER_DARKNESS_THRESHOLD,
            kmeans: KMeansParams::default(),
        }
    }
}

/// Everything the sampling pass learned about the video.
#[derive(Clone, Debug)]
pub struct SampledColumns {
    /// Dominant colors in temporal order, one per output column.
    pub colors: Vec<DominantColor>,
    pub frame_count: usize,
    pub stride: usize,
    pub border: BorderGeometry,
}

pub struct ColumnSampler<'a> {
    source: &'a dyn FrameSource,
    settings: SamplerSettings,
    state: SamplerState,
}

impl<'a> ColumnSampler<'a> {
    pub fn new(source: &'a dyn FrameSource, settings: SamplerSettings) -> Self {
        Self {
            source,
            settings,
            state: SamplerState::Idle,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Count, then sample the whole video.
    ///
    /// Fails with `OversizedSequence` rather than truncating if more colors
    /// were sampled than the output has columns.
    pub fn run(
        &mut self,
        profiler: &mut Profiler,
        reporter: &dyn ProgressReporter,
    ) -> Result<SampledColumns> {
        self.state = SamplerState::Counting;
        reporter.begin_stage(PipelineStage::Counting, None);
        let source = self.source;
        let frame_count = profiler.measure("count_frames", || source.count_frames())?;
        reporter.finish_stage();

        let output_width = self.settings.output_width;
        let stride = sampling_stride(frame_count, output_width)?;
        info!(frame_count, stride, "Number of frames for one pixel column");

        self.state = SamplerState::StreamOpen;
        let frames = source.frames()?;

        self.state = SamplerState::Sampling;
        reporter.begin_stage(PipelineStage::Sampling, Some(frame_count));

        let probe = border_probe_counter(stride);
        let threshold = self.settings.border_threshold;
        let kmeans = &self.settings.kmeans;
        let mut border: Option<BorderGeometry> = None;
        let mut colors = Vec::with_capacity(frame_count / stride + 1);
        let mut counter = 0usize;

        for frame in frames {
            let frame = frame?;
            counter += 1;

            if counter == probe {
                let geometry = profiler.measure("detect_border_height", || {
                    BorderGeometry::measure(&frame, threshold)
                })?;
                info!(
                    border_height = geometry.border_height,
                    frame = counter,
                    "Black bar height"
                );
                border = Some(geometry);
            }

            if counter % stride == 0 {
                let geometry = border.ok_or_else(|| {
                    BarcodeError::Decode("frame sampled before the border was measured".into())
                })?;
                let (top, bottom) = geometry.content_rows();
                let color = profiler.measure("dominant_color", || {
                    dominant_color(frame.rows(top, bottom), kmeans)
                })?;
                debug!(frame = counter, column = colors.len(), bgr = ?color.bgr, "Sampled column");
                colors.push(color);
            }

            reporter.advance(counter);
        }

        reporter.finish_stage();
        self.state = SamplerState::Done;

        if counter != frame_count {
            warn!(
                counted = frame_count,
                sampled = counter,
                "Second pass decoded a different number of frames"
            );
        }

        let border = border.ok_or_else(|| {
            BarcodeError::Decode("video ended before the border probe frame".into())
        })?;

        if colors.len() > output_width {
            return Err(BarcodeError::OversizedSequence {
                columns: colors.len(),
                width: output_width,
            });
        }

        Ok(SampledColumns {
            colors,
            frame_count,
            stride,
            border,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_rounds_up() {
        assert_eq!(sampling_stride(30, 1280).unwrap(), 1);
        assert_eq!(sampling_stride(1280, 1280).unwrap(), 1);
        assert_eq!(sampling_stride(1281, 1280).unwrap(), 2);
        assert_eq!(sampling_stride(2560, 1280).unwrap(), 2);
        assert_eq!(sampling_stride(2561, 1280).unwrap(), 3);
    }

    #[test]
    fn test_stride_rejects_empty_video() {
        assert!(matches!(
            sampling_stride(0, 1280),
            Err(BarcodeError::Open(_))
        ));
    }

    #[test]
    fn test_stride_rejects_zero_width() {
        assert!(matches!(
            sampling_stride(10, 0),
            Err(BarcodeError::Config(_))
        ));
    }

    #[test]
    fn test_probe_precedes_first_sample() {
        assert_eq!(border_probe_counter(1), 1);
        assert_eq!(border_probe_counter(2), 1);
        assert_eq!(border_probe_counter(5), 4);
        for stride in 1..50 {
            assert!(border_probe_counter(stride) <= stride);
        }
    }
}
