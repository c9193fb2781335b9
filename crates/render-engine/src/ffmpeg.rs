//! FFmpeg-backed frame source and WebM sink.
//!
//! Both shell out to the `ffmpeg`/`ffprobe` binaries on `PATH`. Child
//! processes are spawned with `kill_on_drop`, so a seek abandoned by a
//! readiness timeout does not leave a decoder running.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use vidsplice_common::error::{VidspliceError, VidspliceResult};

use crate::frame::{Frame, BYTES_PER_PIXEL};
use crate::sink::{EncodedVideo, EncoderSettings, FrameSink};
use crate::source::{FrameSource, SourceMetadata};

/// Whether both `ffmpeg` and `ffprobe` are on `PATH`.
pub fn is_ffmpeg_available() -> bool {
    command_exists("ffmpeg") && command_exists("ffprobe")
}

fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    #[serde(default)]
    streams: Vec<StreamEntry>,
    format: Option<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

fn parse_secs(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Parse `ffprobe -of json` output into source metadata.
///
/// The video stream's own duration wins over the container's, which also
/// covers audio that may run past the last video frame. Dimensions are the
/// stored ones; decoding runs with `-noautorotate` to match.
fn parse_stream_info(json: &str) -> VidspliceResult<SourceMetadata> {
    let info: StreamInfo = serde_json::from_str(json)
        .map_err(|e| VidspliceError::load(format!("unreadable ffprobe output: {e}")))?;

    let stream = info
        .streams
        .first()
        .ok_or_else(|| VidspliceError::load("source has no video stream"))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(VidspliceError::load("video stream reports no dimensions")),
    };

    let duration_secs = parse_secs(stream.duration.as_deref())
        .or_else(|| parse_secs(info.format.as_ref().and_then(|f| f.duration.as_deref())))
        .ok_or_else(|| VidspliceError::load("source reports no usable duration"))?;

    Ok(SourceMetadata {
        duration_secs,
        width,
        height,
    })
}

/// Seconds argument for `-ss`, with millisecond resolution.
fn seek_position(time_ms: f64) -> String {
    format!("{:.3}", time_ms.max(0.0) / 1000.0)
}

/// `ffmpeg` call decoding the single frame at `time_ms` as raw RGBA on stdout.
fn frame_decode_command(path: &Path, time_ms: f64) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error", "-nostdin", "-noautorotate", "-ss"])
        .arg(seek_position(time_ms))
        .arg("-i")
        .arg(path)
        .args([
            "-frames:v",
            "1",
            "-an",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .kill_on_drop(true);
    cmd
}

/// Decodes single frames from a media file with one `ffmpeg` call per seek.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    path: PathBuf,
    metadata: Option<SourceMetadata>,
    frame: Option<Frame>,
}

impl FfmpegFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
            frame: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn one decode's stdout into the current frame.
    ///
    /// An empty payload means the seek landed past the last video frame;
    /// the previous frame is held in that case.
    fn store_decoded(&mut self, time_ms: f64, mut data: Vec<u8>) -> VidspliceResult<()> {
        let metadata = self
            .metadata
            .ok_or_else(|| VidspliceError::invalid_argument("seek before load"))?;

        if data.is_empty() {
            if self.frame.is_some() {
                tracing::debug!(time_ms, "No frame decoded, holding previous frame");
                return Ok(());
            }
            return Err(VidspliceError::load(format!(
                "no frame decoded at {time_ms:.1}ms"
            )));
        }

        let expected = metadata.width as usize * metadata.height as usize * BYTES_PER_PIXEL;
        if data.len() < expected {
            return Err(VidspliceError::load(format!(
                "frame decode at {time_ms:.1}ms returned {} of {expected} bytes",
                data.len()
            )));
        }

        data.truncate(expected);
        self.frame = Some(Frame::from_rgba(metadata.width, metadata.height, data)?);
        Ok(())
    }
}

#[async_trait::async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn load(&mut self) -> VidspliceResult<SourceMetadata> {
        if !self.path.exists() {
            return Err(VidspliceError::load(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,duration:format=duration",
                "-of",
                "json",
            ])
            .arg(&self.path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VidspliceError::load(format!("Failed to start ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(VidspliceError::load(format!(
                "ffprobe failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let metadata = parse_stream_info(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(path = %self.path.display(), ?metadata, "Read source metadata");
        self.metadata = Some(metadata);
        Ok(metadata)
    }

    async fn seek(&mut self, time_ms: f64) -> VidspliceResult<()> {
        if self.metadata.is_none() {
            return Err(VidspliceError::invalid_argument("seek before load"));
        }

        let output = frame_decode_command(&self.path, time_ms)
            .output()
            .await
            .map_err(|e| VidspliceError::load(format!("Failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(VidspliceError::load(format!(
                "frame decode at {time_ms:.1}ms failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        self.store_decoded(time_ms, output.stdout)
    }

    fn current_frame(&self) -> VidspliceResult<&Frame> {
        self.frame
            .as_ref()
            .ok_or_else(|| VidspliceError::invalid_argument("no frame decoded yet"))
    }

    async fn release(&mut self) {
        self.frame = None;
        self.metadata = None;
    }
}

/// `ffmpeg` arguments that read raw RGBA on stdin and write VP9 WebM to
/// stdout.
pub fn encoder_args(settings: &EncoderSettings) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", settings.width, settings.height),
        "-r".to_string(),
        settings.fps.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        // yuv420p needs even dimensions
        "-vf".to_string(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
        "-c:v".to_string(),
        "libvpx-vp9".to_string(),
        "-b:v".to_string(),
        settings.bitrate_bps.to_string(),
        "-deadline".to_string(),
        "realtime".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-f".to_string(),
        "webm".to_string(),
        "pipe:1".to_string(),
    ]
}

struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_task: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: JoinHandle<String>,
    settings: EncoderSettings,
    frames: u64,
}

/// Streams frames into an `ffmpeg` VP9 encoder and collects the WebM it
/// produces in memory.
#[derive(Default)]
pub struct FfmpegFrameSink {
    process: Option<EncoderProcess>,
}

impl FfmpegFrameSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for FfmpegFrameSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegFrameSink")
            .field("open", &self.process.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl FrameSink for FfmpegFrameSink {
    async fn open(&mut self, settings: &EncoderSettings) -> VidspliceResult<()> {
        if self.process.is_some() {
            return Err(VidspliceError::encode("encoder session already open"));
        }

        let args = encoder_args(settings);
        tracing::debug!(args = ?args, "Starting ffmpeg encoder");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VidspliceError::encode(format!("Failed to start ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| VidspliceError::encode("Failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VidspliceError::encode("Failed to capture ffmpeg stderr"))?;

        // Both pipes are drained concurrently so ffmpeg never blocks on a full pipe.
        let stdout_task = tokio::spawn(async move {
            let mut data = Vec::new();
            stdout.read_to_end(&mut data).await?;
            Ok(data)
        });
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        tracing::info!(
            pid = child.id(),
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            bitrate_bps = settings.bitrate_bps,
            "ffmpeg encoder started"
        );

        self.process = Some(EncoderProcess {
            child,
            stdin,
            stdout_task,
            stderr_task,
            settings: *settings,
            frames: 0,
        });
        Ok(())
    }

    async fn write_frame(&mut self, frame: &Frame) -> VidspliceResult<()> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| VidspliceError::encode("encoder session not open"))?;

        if frame.width() != process.settings.width || frame.height() != process.settings.height {
            return Err(VidspliceError::encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                process.settings.width,
                process.settings.height
            )));
        }

        let stdin = process
            .stdin
            .as_mut()
            .ok_or_else(|| VidspliceError::encode("encoder input already closed"))?;
        stdin
            .write_all(frame.data())
            .await
            .map_err(|e| VidspliceError::encode(format!("Failed writing frame to ffmpeg: {e}")))?;
        process.frames += 1;
        Ok(())
    }

    async fn finish(&mut self) -> VidspliceResult<EncodedVideo> {
        let mut process = self
            .process
            .take()
            .ok_or_else(|| VidspliceError::encode("encoder session not open"))?;

        if let Some(mut stdin) = process.stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| VidspliceError::encode(format!("Failed closing ffmpeg input: {e}")))?;
        }

        let status = process
            .child
            .wait()
            .await
            .map_err(|e| VidspliceError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = process
            .stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());
        check_status(status, &stderr_output)?;

        let data = process
            .stdout_task
            .await
            .map_err(|e| VidspliceError::encode(format!("ffmpeg output reader failed: {e}")))?
            .map_err(|e| VidspliceError::encode(format!("Failed reading ffmpeg output: {e}")))?;

        tracing::debug!(bytes = data.len(), frames = process.frames, "ffmpeg encoder finished");
        Ok(EncodedVideo {
            data,
            frames: process.frames,
        })
    }

    async fn abort(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        drop(process.stdin.take());
        if let Err(err) = process.child.kill().await {
            tracing::warn!(error = %err, "Failed to kill ffmpeg encoder");
        }
        process.stdout_task.abort();
        process.stderr_task.abort();
        tracing::debug!(frames = process.frames, "ffmpeg encoder aborted");
    }
}

fn check_status(status: ExitStatus, stderr_output: &str) -> VidspliceResult<()> {
    if status.success() {
        return Ok(());
    }
    Err(VidspliceError::encode(format!(
        "ffmpeg export failed (status {}): {}",
        status,
        stderr_output.trim()
    )))
}
