//! In-memory stand-in for the video API, shared by dashboard tests.

use crate::api::{
    CreateIndexRequest, Hls, Index, SearchQuery, SearchResult, SummaryRequest, Task,
    UploadRequest, Video, VideoApi, VideoMetadata,
};
use crate::error::{Result, SnipError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned API that counts calls.
#[derive(Default)]
pub struct FakeApi {
    pub indexes: Vec<Index>,
    pub videos: HashMap<String, Vec<Video>>,
    pub results: Vec<SearchResult>,
    pub fail_summary: bool,
    pub fail_search: bool,
    pub summarize_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub retrieve_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<SearchQuery>>,
}

impl FakeApi {
    pub fn with_index(mut self, id: &str, videos: Vec<Video>) -> Self {
        self.indexes.push(Index {
            id: id.to_string(),
            name: format!("Index {}", id),
            created_at: None,
            engines: Vec::new(),
        });
        self.videos.insert(id.to_string(), videos);
        self
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn list_indexes(&self) -> Result<Vec<Index>> {
        Ok(self.indexes.clone())
    }

    async fn retrieve_index(&self, index_id: &str) -> Result<Index> {
        self.indexes
            .iter()
            .find(|i| i.id == index_id)
            .cloned()
            .ok_or_else(|| SnipError::api("retrieve index", "not found"))
    }

    async fn list_videos(&self, index_id: &str, _page_limit: u32) -> Result<Vec<Video>> {
        Ok(self.videos.get(index_id).cloned().unwrap_or_default())
    }

    async fn retrieve_video(&self, index_id: &str, video_id: &str) -> Result<Video> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.videos
            .get(index_id)
            .and_then(|vs| vs.iter().find(|v| v.id == video_id))
            .cloned()
            .ok_or_else(|| SnipError::api("retrieve video", "not found"))
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_search {
            return Err(SnipError::api("search", "service unavailable"));
        }
        Ok(self.results.clone())
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summary {
            return Err(SnipError::api("summarize", "video not ready"));
        }
        Ok(format!("Summary of {}", request.video_id))
    }

    async fn analyze(&self, video_id: &str, prompt: &str) -> Result<String> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("Answer about {}", video_id))
    }

    async fn create_index(&self, _request: &CreateIndexRequest) -> Result<Index> {
        Err(SnipError::api("create index", "not supported"))
    }

    async fn create_task(&self, _request: &UploadRequest<'_>) -> Result<Task> {
        Err(SnipError::api("create task", "not supported"))
    }

    async fn retrieve_task(&self, _task_id: &str) -> Result<Task> {
        Err(SnipError::api("retrieve task", "not supported"))
    }
}

pub fn video(id: &str, filename: &str, duration: f64) -> Video {
    Video {
        id: id.to_string(),
        system_metadata: Some(VideoMetadata {
            filename: Some(filename.to_string()),
            duration: Some(duration),
        }),
        hls: Some(Hls {
            video_url: Some(format!("https://cdn/{}.m3u8", id)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn two_video_api() -> FakeApi {
    FakeApi::default().with_index(
        "ix1",
        vec![video("v1", "intro.mp4", 125.0), video("v2", "outro.mp4", 40.0)],
    )
}
