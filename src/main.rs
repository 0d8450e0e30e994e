//! Snippetropolis CLI entry point.

use anyhow::Result;
use clap::Parser;
use snippetropolis::cli::{commands, Cli, Commands};
use snippetropolis::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the key may come from the shell or the config file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = match &cli.config {
        Some(_) => Settings::load_from(Some(&config_path))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("snippetropolis={},tower_http={}", log_level, log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::CreateIndex { name, engines } => {
            commands::run_create_index(name, engines, settings).await?;
        }

        Commands::UploadVideo {
            index_id,
            video_path,
            language,
        } => {
            commands::run_upload(index_id, video_path, language.clone(), settings).await?;
        }

        Commands::ListIndexes => {
            commands::run_list_indexes(settings).await?;
        }

        Commands::ListVideos { index_id } => {
            commands::run_list_videos(index_id, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path.clone())?;
        }
    }

    Ok(())
}
