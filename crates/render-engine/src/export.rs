//! Export configuration, progress reporting, and the frame export pipeline.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use vidsplice_common::clock::SimulatedClock;
use vidsplice_common::config::{ExportDefaults, QualityPreset, DEFAULT_EXPORT_FILE_NAME};
use vidsplice_common::error::{VidspliceError, VidspliceResult};

use crate::compositor::{compose, OutputGeometry};
use crate::quality::target_bitrate;
use crate::sink::{EncodedVideo, EncoderSettings, FrameSink};
use crate::skip::RemovedRanges;
use crate::source::{FrameSource, SourceMetadata};

/// Steps processed between progress reports unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Upper bound on a single readiness wait unless configured otherwise.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Sampling rate and encoder quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityConfig {
    pub fps: u32,
    pub preset: QualityPreset,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            preset: QualityPreset::Medium,
        }
    }
}

/// Where the finished video is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDestination {
    /// Output directory.
    pub dir: PathBuf,

    /// File name; [`DEFAULT_EXPORT_FILE_NAME`] when absent.
    pub file_name: Option<String>,
}

impl ExportDestination {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: None,
        }
    }

    /// Final output path.
    pub fn path(&self) -> PathBuf {
        let name = self
            .file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_EXPORT_FILE_NAME);
        self.dir.join(name)
    }
}

/// An export job ready to be run against a source and a sink.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Removed `[start, end]` ranges in seconds, in any order.
    pub removed_parts: Vec<[f64; 2]>,

    /// Source time advanced per output frame, in frame durations.
    pub speed_factor: f64,

    /// Output width / height.
    pub aspect_ratio: f64,

    /// Sampling rate and quality preset.
    pub quality: QualityConfig,

    /// Output location.
    pub destination: ExportDestination,

    /// Steps processed between progress reports.
    pub batch_size: usize,

    /// Upper bound on each readiness wait.
    pub readiness_timeout: Duration,
}

impl ExportJob {
    /// A job with default speed, quality and batching and nothing removed.
    pub fn new(destination: ExportDestination, aspect_ratio: f64) -> Self {
        Self {
            removed_parts: Vec::new(),
            speed_factor: 1.0,
            aspect_ratio,
            quality: QualityConfig::default(),
            destination,
            batch_size: DEFAULT_BATCH_SIZE,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
        }
    }

    /// A job seeded from configured export defaults.
    pub fn from_defaults(defaults: &ExportDefaults, aspect_ratio: f64) -> Self {
        let destination = ExportDestination {
            dir: defaults.output_dir.clone(),
            file_name: Some(defaults.file_name.clone()),
        };
        Self {
            quality: QualityConfig {
                fps: defaults.fps,
                preset: defaults.quality,
            },
            batch_size: defaults.batch_size,
            readiness_timeout: Duration::from_millis(defaults.readiness_timeout_ms),
            ..Self::new(destination, aspect_ratio)
        }
    }

    pub fn with_removed_parts(mut self, removed_parts: Vec<[f64; 2]>) -> Self {
        self.removed_parts = removed_parts;
        self
    }

    pub fn with_speed(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Check parameters that do not depend on the source.
    pub fn validate(&self) -> VidspliceResult<()> {
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(VidspliceError::invalid_argument(format!(
                "speed factor must be positive, got {}",
                self.speed_factor
            )));
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(VidspliceError::invalid_argument(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.quality.fps == 0 {
            return Err(VidspliceError::invalid_argument("fps must be positive"));
        }
        if self.batch_size == 0 {
            return Err(VidspliceError::invalid_argument(
                "batch size must be positive",
            ));
        }
        if self.readiness_timeout.is_zero() {
            return Err(VidspliceError::invalid_argument(
                "readiness timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Progress callback for export rendering.
///
/// Called once when each stage is entered and once after every batch of
/// steps while encoding. Until encoding starts `processed` and `total` are
/// both zero.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    /// Simulated-clock steps walked so far, skipped ones included.
    pub processed: u64,

    /// Steps needed to cover the whole source.
    pub total: u64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    /// Fraction complete in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return if self.stage == ExportStage::Done { 1.0 } else { 0.0 };
        }
        (self.processed as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Stages of the export process.
///
/// `Idle → Loading → Encoding → Finalizing → Done`; any non-terminal stage
/// may move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Loading,
    Encoding,
    Finalizing,
    Done,
    Failed,
}

impl ExportStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Encoding => "encoding",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Where the video was saved.
    pub path: PathBuf,

    /// Container size in bytes.
    pub bytes: u64,

    /// Frames handed to the encoder.
    pub frames_encoded: u64,

    /// Steps skipped because they fell in a removed range.
    pub frames_skipped: u64,

    /// Output raster size.
    pub width: u32,
    pub height: u32,

    /// Encoder bitrate in bits per second.
    pub bitrate_bps: u64,

    /// Playback length of the output in seconds.
    pub duration_secs: f64,
}

/// Emits progress and enforces the stage order.
struct StageReporter {
    callback: Option<ProgressCallback>,
    stage: ExportStage,
    processed: u64,
    total: u64,
}

impl StageReporter {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            stage: ExportStage::Idle,
            processed: 0,
            total: 0,
        }
    }

    fn enter(&mut self, stage: ExportStage) {
        debug_assert!(!self.stage.is_terminal(), "export already finished");
        tracing::debug!(from = self.stage.as_str(), to = stage.as_str(), "Export stage");
        self.stage = stage;
        self.emit();
    }

    fn batch_done(&mut self, processed: u64) {
        self.processed = self.processed.max(processed);
        self.emit();
    }

    fn emit(&self) {
        if let Some(cb) = &self.callback {
            cb(ExportProgress {
                processed: self.processed,
                total: self.total,
                stage: self.stage,
            });
        }
    }
}

/// Counters from the frame walk.
#[derive(Debug, Default, Clone, Copy)]
struct WalkSummary {
    encoded: u64,
    skipped: u64,
}

/// Export the non-removed parts of `source` through `sink`.
///
/// This is the main entry point for rendering. The source is always
/// released before returning; on any failure the sink is aborted and no
/// file is written.
pub async fn export_project(
    job: &ExportJob,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    progress: Option<ProgressCallback>,
    cancel: &CancellationToken,
) -> VidspliceResult<ExportArtifact> {
    tracing::info!(
        output = %job.destination.path().display(),
        speed = job.speed_factor,
        aspect_ratio = job.aspect_ratio,
        fps = job.quality.fps,
        quality = %job.quality.preset,
        removed_parts = job.removed_parts.len(),
        "Starting export"
    );

    let started = Instant::now();
    let mut reporter = StageReporter::new(progress);
    let result = run_export(job, source, sink, &mut reporter, cancel).await;
    source.release().await;

    match result {
        Ok(artifact) => {
            reporter.enter(ExportStage::Done);
            tracing::info!(
                path = %artifact.path.display(),
                bytes = artifact.bytes,
                frames = artifact.frames_encoded,
                skipped = artifact.frames_skipped,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Export finished"
            );
            Ok(artifact)
        }
        Err(err) => {
            sink.abort().await;
            if err.is_cancelled() {
                tracing::info!(stage = reporter.stage.as_str(), "Export cancelled");
            } else {
                tracing::error!(stage = reporter.stage.as_str(), error = %err, "Export failed");
            }
            reporter.enter(ExportStage::Failed);
            Err(err)
        }
    }
}

async fn run_export(
    job: &ExportJob,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    reporter: &mut StageReporter,
    cancel: &CancellationToken,
) -> VidspliceResult<ExportArtifact> {
    job.validate()?;
    let removed = RemovedRanges::from_pairs(&job.removed_parts)?;

    reporter.enter(ExportStage::Loading);
    let load_started = Instant::now();
    let metadata = bounded(source.load(), job.readiness_timeout, cancel, || {
        VidspliceError::load(format!(
            "metadata not available within {}ms",
            job.readiness_timeout.as_millis()
        ))
    })
    .await?;
    check_metadata(&metadata)?;
    tracing::info!(
        duration_secs = metadata.duration_secs,
        width = metadata.width,
        height = metadata.height,
        load_ms = load_started.elapsed().as_millis(),
        "Source loaded"
    );

    let clock = SimulatedClock::new(
        job.quality.fps,
        job.speed_factor,
        SimulatedClock::secs_to_ms(metadata.duration_secs),
    )?;
    let kept_steps = clock.steps().filter(|&(_, t)| !removed.contains(t)).count();
    if kept_steps == 0 {
        return Err(VidspliceError::invalid_argument(
            "every sampled frame falls inside a removed part; nothing to export",
        ));
    }

    let geometry = OutputGeometry::fit(metadata.width, metadata.height, job.aspect_ratio)?;
    let settings = EncoderSettings {
        width: geometry.width,
        height: geometry.height,
        fps: job.quality.fps,
        bitrate_bps: target_bitrate(job.quality.preset, geometry.pixel_count()),
    };
    tracing::info!(
        width = settings.width,
        height = settings.height,
        bitrate_bps = settings.bitrate_bps,
        total_steps = clock.total_steps(),
        kept_steps,
        removed_ranges = removed.len(),
        "Export plan built"
    );

    sink.open(&settings).await?;

    reporter.total = clock.total_steps();
    reporter.enter(ExportStage::Encoding);
    let walk = walk_frames(job, &clock, &removed, geometry, source, sink, reporter, cancel).await?;

    reporter.enter(ExportStage::Finalizing);
    let encoded = sink.finish().await?;
    let path = save_artifact(&job.destination, &encoded).await?;

    Ok(ExportArtifact {
        path,
        bytes: encoded.data.len() as u64,
        frames_encoded: walk.encoded,
        frames_skipped: walk.skipped,
        width: settings.width,
        height: settings.height,
        bitrate_bps: settings.bitrate_bps,
        duration_secs: SimulatedClock::ms_to_secs(walk.encoded as f64 * clock.frame_duration_ms()),
    })
}

/// Walk the simulated clock in batches, encoding every kept step in order.
#[allow(clippy::too_many_arguments)]
async fn walk_frames(
    job: &ExportJob,
    clock: &SimulatedClock,
    removed: &RemovedRanges,
    geometry: OutputGeometry,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    reporter: &mut StageReporter,
    cancel: &CancellationToken,
) -> VidspliceResult<WalkSummary> {
    let mut canvas = geometry.blank_frame();
    let mut summary = WalkSummary::default();
    let mut processed = 0u64;
    let mut steps = clock.steps().peekable();

    while steps.peek().is_some() {
        if cancel.is_cancelled() {
            return Err(VidspliceError::Cancelled);
        }

        for (_, time_ms) in steps.by_ref().take(job.batch_size) {
            processed += 1;
            if removed.contains(time_ms) {
                summary.skipped += 1;
                continue;
            }

            bounded(source.seek(time_ms), job.readiness_timeout, cancel, || {
                VidspliceError::ReadinessTimeout {
                    time_ms,
                    waited_ms: job.readiness_timeout.as_millis() as u64,
                }
            })
            .await?;
            compose(source.current_frame()?, &mut canvas);
            sink.write_frame(&canvas).await?;
            summary.encoded += 1;
        }

        reporter.batch_done(processed);
        tracing::trace!(processed, total = reporter.total, "Export batch done");
        tokio::task::yield_now().await;
    }

    Ok(summary)
}

/// Await `fut`, giving up after `limit` or when `cancel` fires.
async fn bounded<T, F>(
    fut: F,
    limit: Duration,
    cancel: &CancellationToken,
    on_timeout: impl FnOnce() -> VidspliceError,
) -> VidspliceResult<T>
where
    F: Future<Output = VidspliceResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(VidspliceError::Cancelled),
        res = tokio::time::timeout(limit, fut) => res.map_err(|_| on_timeout())?,
    }
}

fn check_metadata(metadata: &SourceMetadata) -> VidspliceResult<()> {
    if !metadata.duration_secs.is_finite() || metadata.duration_secs <= 0.0 {
        return Err(VidspliceError::load(format!(
            "source reports unusable duration {}",
            metadata.duration_secs
        )));
    }
    if metadata.width == 0 || metadata.height == 0 {
        return Err(VidspliceError::load(format!(
            "source reports unusable size {}x{}",
            metadata.width, metadata.height
        )));
    }
    Ok(())
}

/// Save the encoded video to its destination.
///
/// Bytes go to a sibling `.part` file first and are renamed into place, so
/// a failed save never leaves a truncated video at the final path.
pub async fn save_artifact(
    destination: &ExportDestination,
    encoded: &EncodedVideo,
) -> VidspliceResult<PathBuf> {
    let path = destination.path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(&path);
    if let Err(err) = write_then_rename(&partial, &path, &encoded.data).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(err.into());
    }

    tracing::info!(path = %path.display(), bytes = encoded.data.len(), "Saved export");
    Ok(path)
}

async fn write_then_rename(partial: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, data).await?;
    tokio::fs::rename(partial, path).await
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
