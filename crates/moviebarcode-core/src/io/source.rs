use std::path::Path;

use tracing::debug;

use crate::error::{BarcodeError, Result};
use crate::frame::{Frame, SourceInfo};
use crate::io::ffmpeg::FfmpegSource;
use crate::io::ser::SerSource;

/// A lazy, finite, non-restartable pass over a video's frames in temporal order.
pub type FrameStream<'a> = Box<dyn Iterator<Item = Result<Frame>> + 'a>;

/// An opened video that can be decoded front to back any number of times.
pub trait FrameSource {
    fn info(&self) -> &SourceInfo;

    /// Start a fresh sequential decode pass from the first frame.
    fn frames(&self) -> Result<FrameStream<'_>>;

    /// Decode every frame to end-of-stream and return how many decoded.
    ///
    /// Runs its own pass, independent of any stream handed out by `frames`.
    fn count_frames(&self) -> Result<usize> {
        let mut count = 0;
        for frame in self.frames()? {
            frame?;
            count += 1;
        }
        debug!(count, backend = self.info().backend, "Counted frames");
        Ok(count)
    }
}

/// Open a video, choosing the backend from the file extension.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.is_file() {
        return Err(BarcodeError::Open(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    let is_ser = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ser"));

    if is_ser {
        Ok(Box::new(SerSource::open(path)?))
    } else {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}
