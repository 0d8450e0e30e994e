//! Gateway to the external video understanding service.
//!
//! One method per external operation. Each performs exactly one network call
//! and reports failures as [`SnipError::Api`](crate::error::SnipError::Api);
//! nothing here caches or retries.

mod models;
mod twelvelabs;

pub use models::{
    extract_text, summary_text, CreateIndexRequest, Engine, Hls, Index, QueryImage, SearchMode,
    SearchQuery, SearchResult, SummaryRequest, Task, Threshold, UploadRequest, Video,
    VideoMetadata,
};
pub use twelvelabs::TwelveLabsClient;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for video understanding API clients.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// List all indexes in the account.
    async fn list_indexes(&self) -> Result<Vec<Index>>;

    /// Get a single index.
    async fn retrieve_index(&self, index_id: &str) -> Result<Index>;

    /// List the videos of an index.
    async fn list_videos(&self, index_id: &str, page_limit: u32) -> Result<Vec<Video>>;

    /// Get a single video, including its streaming URLs.
    async fn retrieve_video(&self, index_id: &str, video_id: &str) -> Result<Video>;

    /// Run a text, image or multimodal search.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;

    /// Generate a summary of a video.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;

    /// Ask an open-ended question about a video.
    async fn analyze(&self, video_id: &str, prompt: &str) -> Result<String>;

    /// Create a new index.
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Index>;

    /// Upload a video file into an index, returning the indexing task.
    async fn create_task(&self, request: &UploadRequest<'_>) -> Result<Task>;

    /// Get the current state of an indexing task.
    async fn retrieve_task(&self, task_id: &str) -> Result<Task>;
}
