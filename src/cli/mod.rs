//! CLI module for Snippetropolis.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Snippetropolis - semantic video search, summaries and chat
///
/// Serves a browser dashboard over a Twelve Labs index and manages the
/// indexes behind it.
#[derive(Parser, Debug)]
#[command(name = "snippetropolis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard web server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a new index
    CreateIndex {
        /// Name of the index
        name: String,

        /// Engines to enable (defaults to indexing.engines)
        #[arg(short, long, num_args = 1..)]
        engines: Vec<String>,
    },

    /// Upload a video to an index and wait for indexing to finish
    UploadVideo {
        /// Target index id
        index_id: String,

        /// Path to the video file
        video_path: String,

        /// Spoken language of the video (defaults to indexing.language)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// List available indexes
    ListIndexes,

    /// List the videos of an index
    ListVideos {
        /// Index id
        index_id: String,
    },

    /// Check configuration and API connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "server.port")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
