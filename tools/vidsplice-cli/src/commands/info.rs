//! Show project information.

use std::path::PathBuf;

use vidsplice_segment_model::{LoadedEditProject, SegmentTimeline};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = LoadedEditProject::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let timeline = &project.timeline;

    println!("Project: {}", project.path.display());
    println!("  Source: {}", project.source_path().display());
    println!("  Length: {:.3}s", timeline.video_length());
    println!(
        "  Kept: {:.3}s in {} of {} parts",
        timeline.kept_duration(),
        timeline.parts().len() - timeline.removed_parts().len(),
        timeline.parts().len()
    );
    println!();
    print_parts(timeline);

    Ok(())
}

pub fn print_parts(timeline: &SegmentTimeline) {
    println!("Parts:");
    for (index, part) in timeline.parts().iter().enumerate() {
        let state = if timeline.is_removed(index) {
            "removed"
        } else {
            "kept"
        };
        println!(
            "  [{index}] {:>9.3}s - {:>9.3}s  ({:.3}s, {state})",
            part.start(),
            part.end(),
            part.duration()
        );
    }
}
