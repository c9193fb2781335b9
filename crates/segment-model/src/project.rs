//! Edit project file.
//!
//! An edit project persists the segment state of one source video as a
//! single JSON document, so edits survive between sessions and can be
//! handed to the exporter.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::timeline::{EditError, SegmentTimeline};

/// Current schema version written by [`EditProject::save`].
pub const PROJECT_VERSION: &str = "1.0";

/// On-disk edit project (`*.vsplice.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditProject {
    /// Schema version.
    pub version: String,

    /// Source media location, as given by the user.
    pub source: String,

    /// Source duration in seconds.
    pub video_length: f64,

    /// Partition of the timeline.
    pub parts: Vec<Interval>,

    /// Tombstoned parts.
    #[serde(default)]
    pub removed_parts: Vec<Interval>,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,
}

/// An edit project together with where it lives and its validated state.
#[derive(Debug, Clone)]
pub struct LoadedEditProject {
    /// Path of the project file.
    pub path: PathBuf,

    /// Source media location.
    pub source: String,

    /// Segment state.
    pub timeline: SegmentTimeline,

    created_at: String,
}

impl EditProject {
    /// Snapshot a timeline for `source`.
    pub fn from_timeline(source: impl Into<String>, timeline: &SegmentTimeline) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: PROJECT_VERSION.to_string(),
            source: source.into(),
            video_length: timeline.video_length(),
            parts: timeline.parts().to_vec(),
            removed_parts: timeline.removed_parts().to_vec(),
            created_at: now.clone(),
            modified_at: now,
        }
    }

    /// Rebuild the segment state, checking the partition invariants.
    pub fn to_timeline(&self) -> Result<SegmentTimeline, EditError> {
        SegmentTimeline::from_parts(
            self.video_length,
            self.parts.clone(),
            self.removed_parts.clone(),
        )
    }
}

impl LoadedEditProject {
    /// Start a new project with a single part spanning `video_length`.
    pub fn create(
        path: impl AsRef<Path>,
        source: impl Into<String>,
        video_length: f64,
    ) -> Result<Self, ProjectError> {
        let timeline = SegmentTimeline::new(video_length)?;
        let loaded = Self {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
            timeline,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Load and validate a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref().to_path_buf();

        let json = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let project: EditProject =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.clone(),
                source: e,
            })?;

        if project.version != PROJECT_VERSION {
            return Err(ProjectError::ValidationError {
                message: format!("unsupported project version {}", project.version),
            });
        }

        let timeline = project.to_timeline()?;

        Ok(Self {
            path,
            source: project.source,
            timeline,
            created_at: project.created_at,
        })
    }

    /// Write the project file, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ProjectError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut project = EditProject::from_timeline(self.source.clone(), &self.timeline);
        project.created_at = self.created_at.clone();

        let json =
            serde_json::to_string_pretty(&project).map_err(|e| ProjectError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
        std::fs::write(&self.path, json).map_err(|e| ProjectError::IoError {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Resolve the source location against the project file's directory.
    pub fn source_path(&self) -> PathBuf {
        let source = Path::new(&self.source);
        if source.is_absolute() {
            return source.to_path_buf();
        }
        match self.path.parent() {
            Some(dir) => dir.join(source),
            None => source.to_path_buf(),
        }
    }
}

/// Errors that can occur when working with edit projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },

    #[error(transparent)]
    Edit(#[from] EditError),
}
