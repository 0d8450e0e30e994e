//! List commands: indexes and the videos of an index.

use crate::api::{TwelveLabsClient, VideoApi};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list-indexes command.
pub async fn run_list_indexes(settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Api)?;
    let client = TwelveLabsClient::from_settings(&settings)?;

    match client.list_indexes().await {
        Ok(indexes) => {
            if indexes.is_empty() {
                Output::info(
                    "No indexes found. Use 'snippetropolis create-index <name>' to create one.",
                );
            } else {
                Output::header(&format!("Indexes ({})", indexes.len()));
                println!();

                for index in &indexes {
                    Output::index_info(&index.name, &index.id, &index.engine_names());
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list indexes: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Run the list-videos command.
pub async fn run_list_videos(index_id: &str, settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Api)?;
    let client = TwelveLabsClient::from_settings(&settings)?;

    match client
        .list_videos(index_id, settings.indexing.video_page_limit)
        .await
    {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info(&format!(
                    "No videos in this index. Use 'snippetropolis upload-video {} <file>' to add one.",
                    index_id
                ));
            } else {
                Output::header(&format!("Videos ({})", videos.len()));
                println!();

                for video in &videos {
                    Output::video_info(
                        video.filename().unwrap_or("(unnamed)"),
                        &video.id,
                        video.duration(),
                    );
                }

                let total: f64 = videos.iter().filter_map(|v| v.duration()).sum();
                println!();
                Output::kv("Total videos", &videos.len().to_string());
                Output::kv("Total length", &format!("{:.0}s", total));
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
