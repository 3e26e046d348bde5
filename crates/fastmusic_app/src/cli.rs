use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fastmusic_core::AudioQuality;

/// Top-level CLI for FastMusic.
#[derive(Debug, Parser)]
#[command(name = "fastmusic")]
#[command(about = "Search YouTube and save the audio through a FastMusic backend", long_about = None)]
pub struct Cli {
    /// Config file (RON). Defaults to ./fastmusic.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Directory downloads are saved into.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Bitrate for downloads: 128, 192, 256 or 320.
    #[arg(long, global = true)]
    pub quality: Option<AudioQuality>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Search and print results, optionally downloading some of them.
    Search {
        /// Search terms.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// 1-based result rows to download once results arrive.
        #[arg(long = "download", short = 'd')]
        download: Vec<usize>,
    },

    /// Download audio from a YouTube link.
    Url {
        url: String,
    },

    /// Download audio for a video id.
    Get {
        video_id: String,

        /// Title used for the file name when the backend sends none.
        #[arg(long)]
        title: Option<String>,
    },

    /// Check that the backend is up.
    Health,

    /// Line-based interactive session (the default).
    Interactive,
}

impl Cli {
    pub fn command(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Interactive)
    }
}
