//! Apply one edit command to a project and save it.

use std::path::PathBuf;

use vidsplice_segment_model::{EditCommand, EditSignal, LoadedEditProject};

pub fn run(path: PathBuf, command: EditCommand) -> anyhow::Result<()> {
    let mut project = LoadedEditProject::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let signals = project
        .timeline
        .apply(command)
        .map_err(|e| anyhow::anyhow!("{command:?} rejected: {e}"))?;

    if signals.is_empty() {
        println!("No change.");
        return Ok(());
    }

    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    tracing::debug!(?command, signals = signals.len(), "Applied edit");

    for signal in &signals {
        match signal {
            EditSignal::PartsChanged(parts) => println!("Parts: {}", parts.len()),
            EditSignal::RemovedPartsChanged(removed) => {
                println!("Removed parts: {}", removed.len())
            }
            EditSignal::RequestEject | EditSignal::RequestExport => {}
        }
    }
    println!();
    super::info::print_parts(&project.timeline);

    Ok(())
}
