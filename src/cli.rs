use clap::{Parser, Subcommand};
use ffmirror::engine::TargetFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffmirror")]
#[command(about = "Batch video converter that mirrors folder trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every recognized video under SOURCE into DEST, keeping subfolders
    Convert {
        /// Folder to scan for videos
        source: PathBuf,

        /// Folder that receives the converted tree
        dest: PathBuf,

        /// Output container (defaults to the configured target format)
        #[arg(short, long, value_enum)]
        format: Option<TargetFormat>,

        /// Path to the ffmpeg executable (overrides config)
        #[arg(long, value_name = "PATH")]
        ffmpeg: Option<PathBuf>,

        /// Give up on a single attempt after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Allow SOURCE and DEST to be the same folder
        #[arg(long)]
        allow_same_dir: bool,

        /// Append run log lines to this file (overrides config)
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the videos that would be converted
    Scan {
        /// Folder to scan for videos
        source: PathBuf,
    },

    /// Show the ffmpeg commands for every file without executing them
    DryRun {
        /// Folder to scan for videos
        source: PathBuf,

        /// Folder that would receive the converted tree
        dest: PathBuf,

        /// Output container (defaults to the configured target format)
        #[arg(short, long, value_enum)]
        format: Option<TargetFormat>,

        /// Path to the ffmpeg executable (overrides config)
        #[arg(long, value_name = "PATH")]
        ffmpeg: Option<PathBuf>,
    },

    /// Check that ffmpeg can be executed
    CheckFfmpeg {
        /// Path to the ffmpeg executable (overrides config)
        #[arg(long, value_name = "PATH")]
        ffmpeg: Option<PathBuf>,
    },

    /// List recognized input extensions and supported output formats
    Formats,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
