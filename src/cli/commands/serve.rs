//! Dashboard web server.

use crate::api::{TwelveLabsClient, VideoApi};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dashboard::{router, Dashboard};
use std::sync::Arc;
use tracing::info;

/// Run the dashboard server until interrupted.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    preflight::check(&settings, Operation::Api)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let api: Arc<dyn VideoApi> = Arc::new(TwelveLabsClient::from_settings(&settings)?);
    let app = router(Dashboard::new(api, settings));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dashboard bound to {}", addr);

    Output::header("Snippetropolis Dashboard");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    println!();
    println!("Pages:");
    Output::kv("Index picker", "GET  /");
    Output::kv("Search", "GET  /?page=search&index_id=...");
    Output::kv("Summaries", "GET  /?page=videos&index_id=...");
    Output::kv("Chat", "GET  /?page=chat&index_id=...");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
