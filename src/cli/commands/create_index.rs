//! Create-index command implementation.

use crate::api::{CreateIndexRequest, TwelveLabsClient, VideoApi};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::{bail, Result};

/// Run the create-index command.
///
/// Without `--engines`, the engines from `indexing.engines` are enabled.
pub async fn run_create_index(name: &str, engines: &[String], settings: Settings) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Index name must not be empty");
    }
    preflight::check(&settings, Operation::Api)?;

    let engines = if engines.is_empty() {
        settings.indexing.engines.clone()
    } else {
        engines.to_vec()
    };
    if engines.is_empty() {
        bail!("No engines given. Pass --engines or set indexing.engines in the config file.");
    }

    let client = TwelveLabsClient::from_settings(&settings)?;
    let request = CreateIndexRequest::new(name, &engines);

    let spinner = Output::spinner(&format!("Creating index '{}'...", name));
    let result = client.create_index(&request).await;
    spinner.finish_and_clear();

    match result {
        Ok(index) => {
            Output::success(&format!("Created index '{}'", name));
            Output::kv("Index ID", &index.id);
            Output::kv("Engines", &engines.join(", "));
            println!();
            Output::info(&format!(
                "Upload videos with: snippetropolis upload-video {} <file>",
                index.id
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to create index: {}", e));
            Err(e.into())
        }
    }
}
