//! Create a new edit project for a source video.

use std::path::{Path, PathBuf};

use vidsplice_render_engine::{FfmpegFrameSource, FrameSource};
use vidsplice_segment_model::LoadedEditProject;

pub async fn run(
    source: PathBuf,
    output: Option<PathBuf>,
    length: Option<f64>,
) -> anyhow::Result<()> {
    let project_path = output.unwrap_or_else(|| default_project_path(&source));

    let video_length = match length {
        Some(secs) => secs,
        None => {
            let mut reader = FfmpegFrameSource::new(&source);
            let metadata = reader
                .load()
                .await
                .map_err(|e| {
                    anyhow::anyhow!("Failed to read metadata of {}: {e}", source.display())
                })?;
            reader.release().await;
            metadata.duration_secs
        }
    };

    let stored_source = std::fs::canonicalize(&source).unwrap_or_else(|_| source.clone());
    println!(
        "Creating edit project for {} at {}",
        source.display(),
        project_path.display()
    );

    let project = LoadedEditProject::create(
        &project_path,
        stored_source.to_string_lossy(),
        video_length,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  File: {}", project.path.display());
    println!("  Length: {:.3}s", project.timeline.video_length());
    println!();
    println!("Next: `vidsplice cut {} <SECS>`", project.path.display());

    Ok(())
}

/// `clip.mp4` → `clip.vsplice.json` beside the source.
fn default_project_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "edit".to_string());
    source.with_file_name(format!("{stem}.vsplice.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_project_path_sits_beside_source() {
        assert_eq!(
            default_project_path(Path::new("/videos/clip.mp4")),
            PathBuf::from("/videos/clip.vsplice.json")
        );
        assert_eq!(
            default_project_path(Path::new("talk.webm")),
            PathBuf::from("talk.vsplice.json")
        );
    }
}
