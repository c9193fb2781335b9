//! Export the kept parts of a project to video.

use std::io::Write;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use vidsplice_common::config::{ExportDefaults, QualityPreset};
use vidsplice_render_engine::export::{
    export_project, ExportJob, ExportProgress, ExportStage, ProgressCallback, QualityConfig,
};
use vidsplice_render_engine::{FfmpegFrameSink, FfmpegFrameSource, FrameSource};
use vidsplice_segment_model::LoadedEditProject;

/// Command-line overrides on top of configured export defaults.
pub struct ExportArgs {
    pub speed: f64,
    pub aspect: Option<String>,
    pub fps: Option<u32>,
    pub quality: Option<String>,
    pub output: Option<PathBuf>,
    pub name: Option<String>,
}

pub async fn run(
    path: PathBuf,
    args: ExportArgs,
    defaults: &ExportDefaults,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let project = LoadedEditProject::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let source_path = project.source_path();

    let aspect_ratio = match args.aspect.as_deref() {
        Some(raw) => parse_aspect(raw)?,
        None => {
            let mut reader = FfmpegFrameSource::new(&source_path);
            let metadata = reader
                .load()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read source metadata: {e}"))?;
            reader.release().await;
            metadata.width as f64 / metadata.height as f64
        }
    };

    let preset = match args.quality.as_deref() {
        Some(raw) => raw.parse::<QualityPreset>()?,
        None => defaults.quality,
    };

    let mut job = ExportJob::from_defaults(defaults, aspect_ratio)
        .with_removed_parts(project.timeline.removed_pairs())
        .with_speed(args.speed)
        .with_quality(QualityConfig {
            fps: args.fps.unwrap_or(defaults.fps),
            preset,
        });
    if let Some(dir) = args.output {
        job.destination.dir = dir;
    }
    if let Some(name) = args.name {
        job.destination.file_name = Some(name);
    }

    println!("  Source: {}", source_path.display());
    println!("  Output: {}", job.destination.path().display());
    println!(
        "  Speed: {}x, aspect {:.4}, {}fps, {} quality",
        job.speed_factor, job.aspect_ratio, job.quality.fps, job.quality.preset
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling export");
            on_interrupt.cancel();
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        if p.stage == ExportStage::Encoding {
            print!(
                "\r  Progress: {:.1}% ({}/{} steps)  ",
                p.progress() * 100.0,
                p.processed,
                p.total,
            );
            let _ = std::io::stdout().flush();
        }
    });

    let mut source = FfmpegFrameSource::new(&source_path);
    let mut sink = FfmpegFrameSink::new();
    match export_project(&job, &mut source, &mut sink, Some(progress_cb), &cancel).await {
        Ok(artifact) => {
            println!("\nExport complete: {}", artifact.path.display());
            println!(
                "  {} frames ({:.2}s) at {}x{}, {} bytes",
                artifact.frames_encoded,
                artifact.duration_secs,
                artifact.width,
                artifact.height,
                artifact.bytes
            );
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nExport cancelled; no file written.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Export failed: {e}")),
    }
}

/// Parse `16:9`, `9/16` or a plain decimal ratio.
fn parse_aspect(raw: &str) -> anyhow::Result<f64> {
    let raw = raw.trim();
    let ratio = match raw.split_once([':', '/']) {
        Some((w, h)) => {
            let w: f64 = w.trim().parse()?;
            let h: f64 = h.trim().parse()?;
            w / h
        }
        None => raw.parse()?,
    };
    if !ratio.is_finite() || ratio <= 0.0 {
        anyhow::bail!("aspect ratio must be positive, got {raw}");
    }
    Ok(ratio)
}
