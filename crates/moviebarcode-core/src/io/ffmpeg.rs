//! Video decoding through the `ffmpeg` / `ffprobe` command line tools.
//!
//! Each pass spawns a fresh `ffmpeg` process that writes raw BGR24 frames to
//! its stdout. A reader thread slices the pipe into frames and prefetches them
//! over a bounded channel, so decoding overlaps with processing while frames
//! still arrive strictly in order.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::consts::{COLOR_CHANNEL_COUNT, FFMPEG_PREFETCH_FRAMES};
use crate::error::{BarcodeError, Result};
use crate::frame::{Frame, FrameMetadata, SourceInfo};
use crate::io::source::{FrameSource, FrameStream};

/// `FrameSource` backed by an external ffmpeg install.
pub struct FfmpegSource {
    path: PathBuf,
    info: SourceInfo,
}

impl FfmpegSource {
    /// Probe the first video stream of `path`. Fails with `Open` if ffprobe
    /// is missing or cannot read the file.
    pub fn open(path: &Path) -> Result<Self> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height,nb_frames")
            .arg("-of")
            .arg("csv=p=0")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BarcodeError::Open(format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BarcodeError::Open(format!(
                "{}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (width, height, declared_frames) = parse_probe_output(&stdout)?;
        debug!(width, height, ?declared_frames, "Probed video stream");

        Ok(Self {
            path: path.to_path_buf(),
            info: SourceInfo {
                filename: path.to_path_buf(),
                width,
                height,
                declared_frames,
                backend: "ffmpeg",
            },
        })
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn frames(&self) -> Result<FrameStream<'_>> {
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        if width == 0 || height == 0 {
            return Err(BarcodeError::Decode(format!(
                "video stream reports {width}x{height} frames"
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-nostdin")
            // Keep frames at the probed geometry.
            .arg("-noautorotate")
            .arg("-i")
            .arg(&self.path)
            .arg("-map")
            .arg("0:v:0")
            .arg("-an")
            .arg("-pix_fmt")
            .arg("bgr24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-");

        let rx = spawn_ffmpeg_reader(cmd, width, height)?;
        Ok(Box::new(rx.into_iter()))
    }
}

/// Parse `width,height,nb_frames` as printed by ffprobe's csv writer.
fn parse_probe_output(stdout: &str) -> Result<(u32, u32, Option<usize>)> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BarcodeError::Open("no video stream found".into()))?;

    let mut fields = line.split(',').map(str::trim);
    let mut dimension = |name: &str| -> Result<u32> {
        fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| BarcodeError::Open(format!("ffprobe reported no {name}: {line:?}")))
    };
    let width = dimension("width")?;
    let height = dimension("height")?;
    let declared_frames = fields.next().and_then(|v| v.parse().ok());

    Ok((width, height, declared_frames))
}

fn spawn_ffmpeg_reader(
    mut cmd: Command,
    width: usize,
    height: usize,
) -> Result<Receiver<Result<Frame>>> {
    let (tx, rx) = bounded(FFMPEG_PREFETCH_FRAMES);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| BarcodeError::Open(format!("failed to run ffmpeg: {e}")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| BarcodeError::Open("failed to capture ffmpeg stdout".into()))?;

    // Drain stderr on its own thread so a chatty decoder cannot stall the pipe.
    let stderr_drain = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    thread::Builder::new()
        .name("ffmpeg-reader".into())
        .spawn(move || {
            let end = ffmpeg_loop(stdout, &mut child, width, height, &tx);
            let stderr = stderr_drain
                .and_then(|h| h.join().ok())
                .unwrap_or_default();
            if let Err(err) = end.and_then(|end| check_exit(&mut child, end, &stderr)) {
                let _ = tx.send(Err(err));
            }
        })?;

    Ok(rx)
}

/// Why the reader stopped pulling frames from ffmpeg.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadEnd {
    /// ffmpeg closed its stdout.
    Eof { produced: usize },
    /// The stream was dropped, so ffmpeg was killed.
    Cancelled { produced: usize },
}

/// Read frames until end-of-stream or until the consumer goes away.
fn ffmpeg_loop(
    mut stdout: ChildStdout,
    child: &mut Child,
    width: usize,
    height: usize,
    tx: &Sender<Result<Frame>>,
) -> Result<ReadEnd> {
    let frame_bytes = width * height * COLOR_CHANNEL_COUNT;
    let mut produced = 0;

    loop {
        let mut buffer = vec![0u8; frame_bytes];
        match read_full(&mut stdout, &mut buffer)? {
            0 => break,
            n if n < frame_bytes => {
                warn!(
                    frame = produced,
                    bytes = n,
                    expected = frame_bytes,
                    "Dropping truncated trailing frame"
                );
                break;
            }
            _ => {}
        }

        let mut frame = Frame::from_bgr24(width, height, buffer)?;
        frame.metadata = FrameMetadata {
            frame_index: produced,
        };
        if tx.send(Ok(frame)).is_err() {
            let _ = child.kill();
            return Ok(ReadEnd::Cancelled { produced });
        }
        produced += 1;
    }

    Ok(ReadEnd::Eof { produced })
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[derive(Debug, PartialEq, Eq)]
enum ExitVerdict {
    Clean,
    Cancelled { produced: usize },
    StoppedEarly { produced: usize },
    Failed,
}

fn judge_exit(success: bool, end: ReadEnd) -> ExitVerdict {
    match end {
        ReadEnd::Cancelled { produced } => ExitVerdict::Cancelled { produced },
        ReadEnd::Eof { .. } if success => ExitVerdict::Clean,
        ReadEnd::Eof { produced: 0 } => ExitVerdict::Failed,
        ReadEnd::Eof { produced } => ExitVerdict::StoppedEarly { produced },
    }
}

fn check_exit(child: &mut Child, end: ReadEnd, stderr: &str) -> Result<()> {
    let status = child.wait()?;
    match judge_exit(status.success(), end) {
        ExitVerdict::Clean => {}
        ExitVerdict::Cancelled { produced } => {
            debug!(%status, frames = produced, "Stream dropped, ffmpeg stopped")
        }
        ExitVerdict::StoppedEarly { produced } => {
            warn!(%status, frames = produced, "ffmpeg stopped early, keeping decoded frames")
        }
        ExitVerdict::Failed => {
            return Err(BarcodeError::Decode(format!(
                "ffmpeg exited with {status}: {}",
                stderr.trim()
            )));
        }
    }
    Ok(())
}
