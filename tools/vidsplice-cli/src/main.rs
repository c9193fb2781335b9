//! VidSplice CLI: split a video into parts, drop the ones you don't want,
//! and export the rest.
//!
//! Usage:
//!   vidsplice init <SOURCE>               Create an edit project for a video
//!   vidsplice cut <PROJECT> <SECS>        Split the part containing SECS
//!   vidsplice uncut <PROJECT> <SECS>      Merge the parts meeting at SECS
//!   vidsplice remove <PROJECT> <INDEX>    Mark a part as removed
//!   vidsplice restore <PROJECT> <INDEX>   Bring a removed part back
//!   vidsplice info <PROJECT>              Show parts and removed state
//!   vidsplice export <PROJECT>            Export the kept parts to WebM
//!   vidsplice check                       Check for ffmpeg/ffprobe

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vidsplice_segment_model::EditCommand;

mod commands;

#[derive(Parser)]
#[command(
    name = "vidsplice",
    about = "Frame-accurate video cutting and export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an edit project for a source video
    Init {
        /// Source video file
        source: PathBuf,

        /// Project file to write (defaults to <SOURCE>.vsplice.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source length in seconds (read with ffprobe when omitted)
        #[arg(long)]
        length: Option<f64>,
    },

    /// Insert a cut, splitting the part that contains it
    Cut {
        /// Path to the edit project
        project: PathBuf,

        /// Cut position in seconds
        secs: f64,
    },

    /// Remove a cut, merging the two parts that meet there
    Uncut {
        /// Path to the edit project
        project: PathBuf,

        /// Cut position in seconds
        secs: f64,
    },

    /// Mark a part as removed
    Remove {
        /// Path to the edit project
        project: PathBuf,

        /// Zero-based part index
        index: usize,
    },

    /// Restore a removed part
    Restore {
        /// Path to the edit project
        project: PathBuf,

        /// Zero-based part index
        index: usize,
    },

    /// Show project information
    Info {
        /// Path to the edit project
        project: PathBuf,
    },

    /// Export the kept parts of a project to video
    Export {
        /// Path to the edit project
        project: PathBuf,

        /// Playback speed factor
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Output aspect ratio, as `W:H` or a decimal (defaults to the source's)
        #[arg(long)]
        aspect: Option<String>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Quality preset: low|medium|high
        #[arg(long)]
        quality: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = vidsplice_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    vidsplice_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            source,
            output,
            length,
        } => commands::init::run(source, output, length).await,
        Commands::Cut { project, secs } => {
            commands::edit::run(project, EditCommand::InsertCut(secs))
        }
        Commands::Uncut { project, secs } => {
            commands::edit::run(project, EditCommand::RemoveCut(secs))
        }
        Commands::Remove { project, index } => {
            commands::edit::run(project, EditCommand::MarkRemoved(index))
        }
        Commands::Restore { project, index } => {
            commands::edit::run(project, EditCommand::Restore(index))
        }
        Commands::Info { project } => commands::info::run(project),
        Commands::Export {
            project,
            speed,
            aspect,
            fps,
            quality,
            output,
            name,
        } => {
            commands::export::run(
                project,
                commands::export::ExportArgs {
                    speed,
                    aspect,
                    fps,
                    quality,
                    output,
                    name,
                },
                &config.export,
            )
            .await
        }
        Commands::Check => commands::check::run(),
    }
}
