//! Upload-video command: create an indexing task and wait for it.

use crate::api::{Task, TwelveLabsClient, UploadRequest, VideoApi};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result as SnipResult;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Run the upload-video command.
///
/// Fails unless the task ends `ready`.
pub async fn run_upload(
    index_id: &str,
    video_path: &str,
    language: Option<String>,
    settings: Settings,
) -> Result<()> {
    let path = PathBuf::from(shellexpand::tilde(video_path).as_ref());
    preflight::check(&settings, Operation::Upload(&path))?;

    let language = language.unwrap_or_else(|| settings.indexing.language.clone());
    let interval = Duration::from_secs(settings.indexing.poll_interval_secs.max(1));
    let client = TwelveLabsClient::from_settings(&settings)?;

    let index = match client.retrieve_index(index_id).await {
        Ok(index) => index,
        Err(e) => {
            Output::error(&format!("Index {} is not available: {}", index_id, e));
            return Err(e.into());
        }
    };

    let spinner = Output::spinner(&format!(
        "Uploading {} to '{}'...",
        path.display(),
        index.name
    ));
    let request = UploadRequest {
        index_id,
        path: &path,
        language: Some(&language),
    };
    let task = match client.create_task(&request).await {
        Ok(task) => task,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Upload failed: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message(format!("Indexing (task {})...", task.id));
    let result = wait_for_task(&client, &task.id, interval, |task| {
        spinner.set_message(format!("Indexing (task {}): {}", task.id, task.status()));
    })
    .await;
    spinner.finish_and_clear();

    let task = match result {
        Ok(task) => task,
        Err(e) => {
            Output::error(&format!("Could not check task {}: {}", task.id, e));
            return Err(e.into());
        }
    };

    if !task.is_ready() {
        Output::error(&format!("Indexing finished with status '{}'", task.status()));
        bail!("Task {} did not become ready", task.id);
    }

    Output::success("Video indexed");
    Output::kv("Task ID", &task.id);
    if let Some(video_id) = &task.video_id {
        Output::kv("Video ID", video_id);
    }
    Ok(())
}

/// Poll a task every `interval` until it is ready or failed.
///
/// `on_status` sees every intermediate state.
pub async fn wait_for_task<F>(
    api: &dyn VideoApi,
    task_id: &str,
    interval: Duration,
    mut on_status: F,
) -> SnipResult<Task>
where
    F: FnMut(&Task),
{
    loop {
        let task = api.retrieve_task(task_id).await?;
        debug!("Task {} status: {}", task.id, task.status());
        on_status(&task);

        if task.is_terminal() {
            return Ok(task);
        }
        tokio::time::sleep(interval).await;
    }
}
