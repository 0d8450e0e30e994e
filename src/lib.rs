//! Snippetropolis - semantic video search, summaries and chat
//!
//! A browser dashboard over a Twelve Labs video index, plus a small CLI for
//! creating indexes and uploading videos.
//!
//! # Overview
//!
//! Snippetropolis allows you to:
//! - Pick one of your indexes and search it by text, image, or both
//! - Read a generated summary of any video in the index
//! - Hold a multi-turn chat about a single video
//! - Create indexes and upload videos from the command line
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `api` - Typed client for the video understanding API
//! - `session` - Navigation state and the per-session result cache
//! - `dashboard` - Page orchestration, templates and the HTTP server
//! - `cli` - Command line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use snippetropolis::api::{TwelveLabsClient, VideoApi};
//! use snippetropolis::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let client = TwelveLabsClient::from_settings(&settings)?;
//!
//!     for index in client.list_indexes().await? {
//!         println!("{} ({})", index.name, index.id);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;

pub use error::{Result, SnipError};
