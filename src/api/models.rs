//! Typed request and response models for the video understanding API.
//!
//! Every field the service may omit is an `Option`, so consumers match on
//! presence instead of probing the raw JSON.

use crate::error::{Result, SnipError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// A collection of processed videos supporting search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "index_name", alias = "name", default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "models", alias = "engines", default)]
    pub engines: Vec<Engine>,
}

/// A model configuration selected when the index was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    #[serde(rename = "model_name", alias = "engine_name", alias = "name")]
    pub name: String,
    #[serde(rename = "model_options", alias = "engine_options", default)]
    pub options: Vec<String>,
}

impl Index {
    /// Comma-separated engine names, for display.
    pub fn engine_names(&self) -> String {
        self.engines
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A video owned by an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub system_metadata: Option<VideoMetadata>,
    /// Older API versions report system metadata under this key.
    #[serde(default)]
    pub metadata: Option<VideoMetadata>,
    #[serde(default)]
    pub hls: Option<Hls>,
}

/// File-level metadata computed by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Streaming information for a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hls {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_urls: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Video {
    fn meta(&self) -> Option<&VideoMetadata> {
        self.system_metadata.as_ref().or(self.metadata.as_ref())
    }

    pub fn filename(&self) -> Option<&str> {
        self.meta().and_then(|m| m.filename.as_deref())
    }

    /// Duration in seconds.
    pub fn duration(&self) -> Option<f64> {
        self.meta().and_then(|m| m.duration)
    }

    pub fn video_url(&self) -> Option<&str> {
        self.hls
            .as_ref()
            .and_then(|h| h.video_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.hls
            .as_ref()
            .and_then(|h| h.thumbnail_urls.as_ref())
            .and_then(|urls| urls.first())
            .map(String::as_str)
    }
}

/// One ranked match returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub video_id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    /// Matched transcript or on-screen text.
    #[serde(default, alias = "transcription")]
    pub text: Option<String>,
    /// Confidence level (high, medium, low).
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl SearchResult {
    /// The matching time range, when both ends are known.
    pub fn segment(&self) -> Option<(f64, f64)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Minimum confidence level for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Threshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            Threshold::High => "high",
            Threshold::Medium => "medium",
            Threshold::Low => "low",
            Threshold::None => "none",
        }
    }
}

/// What the user searches with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Text,
    Image,
    Multimodal,
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(SearchMode::Text),
            "image" => Ok(SearchMode::Image),
            "multimodal" => Ok(SearchMode::Multimodal),
            _ => Err(format!("Unknown search mode: {}", s)),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Text => write!(f, "text"),
            SearchMode::Image => write!(f, "image"),
            SearchMode::Multimodal => write!(f, "multimodal"),
        }
    }
}

impl SearchMode {
    /// Whether the given inputs are enough to run a search in this mode.
    pub fn accepts(&self, has_text: bool, has_image: bool) -> bool {
        match self {
            SearchMode::Text => has_text,
            SearchMode::Image => has_image,
            SearchMode::Multimodal => has_text || has_image,
        }
    }
}

/// An image uploaded as a search query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// A fully specified search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub index_id: String,
    pub text: Option<String>,
    pub image: Option<QueryImage>,
    pub options: Vec<String>,
    pub page_limit: u32,
    pub threshold: Threshold,
}

impl SearchQuery {
    /// Build a query, keeping only the inputs the mode uses.
    ///
    /// Blank text and empty images count as absent.
    pub fn new(
        index_id: &str,
        mode: SearchMode,
        text: Option<String>,
        image: Option<QueryImage>,
    ) -> Result<Self> {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && mode != SearchMode::Image);
        let image = image.filter(|i| !i.bytes.is_empty() && mode != SearchMode::Text);

        if !mode.accepts(text.is_some(), image.is_some()) {
            return Err(SnipError::InvalidInput(match mode {
                SearchMode::Text => "enter a search query".to_string(),
                SearchMode::Image => "upload an image to search with".to_string(),
                SearchMode::Multimodal => "enter a query or upload an image".to_string(),
            }));
        }

        Ok(Self {
            index_id: index_id.to_string(),
            text,
            image,
            options: vec!["visual".to_string(), "audio".to_string()],
            page_limit: 10,
            threshold: Threshold::None,
        })
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }
}

/// A summary request for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub video_id: String,
    #[serde(rename = "type")]
    pub summary_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A video indexing task created by an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub system_metadata: Option<VideoMetadata>,
}

impl Task {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    pub fn is_ready(&self) -> bool {
        self.status() == "ready"
    }

    /// Ready or failed; polling stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status(), "ready" | "failed")
    }
}

/// Request body for index creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexRequest {
    pub index_name: String,
    pub models: Vec<Engine>,
    pub addons: Vec<String>,
}

impl CreateIndexRequest {
    /// Every engine indexes both modalities; thumbnails are always generated.
    pub fn new(name: &str, engines: &[String]) -> Self {
        Self {
            index_name: name.to_string(),
            models: engines
                .iter()
                .map(|e| Engine {
                    name: e.clone(),
                    options: vec!["visual".to_string(), "audio".to_string()],
                })
                .collect(),
            addons: vec!["thumbnail".to_string()],
        }
    }
}

/// An upload of a local file into an index.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest<'a> {
    pub index_id: &'a str,
    pub path: &'a Path,
    pub language: Option<&'a str>,
}

/// Envelope for paginated list responses.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Page<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

/// Pull free text out of a summary or analysis response.
///
/// The first of `fields` holding a non-empty string wins; a non-string value
/// is rendered as JSON. When none is present the whole response is
/// stringified.
pub fn extract_text(value: &serde_json::Value, fields: &[&str]) -> String {
    for field in fields {
        match value.get(*field) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return s.clone(),
            Some(serde_json::Value::Null) | None => continue,
            Some(serde_json::Value::String(_)) => continue,
            Some(other) => return other.to_string(),
        }
    }
    value.to_string()
}

/// Summary response in any of its shapes: `summary` text, or the chapter or
/// highlight lists of the other summary types.
#[derive(Debug, Default, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    chapters: Vec<Chapter>,
    #[serde(default)]
    highlights: Vec<Highlight>,
}

#[derive(Debug, Deserialize)]
struct Chapter {
    #[serde(default, alias = "start")]
    start_sec: f64,
    #[serde(default, alias = "end")]
    end_sec: f64,
    #[serde(default)]
    chapter_title: String,
    #[serde(default)]
    chapter_summary: String,
}

#[derive(Debug, Deserialize)]
struct Highlight {
    #[serde(default, alias = "start")]
    start_sec: f64,
    #[serde(default, alias = "end")]
    end_sec: f64,
    #[serde(default)]
    highlight: String,
    #[serde(default)]
    highlight_summary: String,
}

/// Render a summary response as plain text.
///
/// Chapters and highlights become one timed block each.
pub fn summary_text(value: &serde_json::Value) -> String {
    let response: SummaryResponse = serde_json::from_value(value.clone()).unwrap_or_default();

    if let Some(summary) = response.summary.filter(|s| !s.trim().is_empty()) {
        return summary;
    }

    let blocks: Vec<String> = if !response.chapters.is_empty() {
        response
            .chapters
            .iter()
            .map(|c| timed_block(c.start_sec, c.end_sec, &c.chapter_title, &c.chapter_summary))
            .collect()
    } else {
        response
            .highlights
            .iter()
            .map(|h| timed_block(h.start_sec, h.end_sec, &h.highlight, &h.highlight_summary))
            .collect()
    };

    if blocks.is_empty() {
        extract_text(value, &["summary", "data"])
    } else {
        blocks.join("\n\n")
    }
}

fn timed_block(start: f64, end: f64, title: &str, body: &str) -> String {
    let clock = |secs: f64| {
        let total = secs.max(0.0) as u64;
        format!("{}:{:02}", total / 60, total % 60)
    };
    let heading = format!("[{} - {}] {}", clock(start), clock(end), title.trim());
    match body.trim() {
        "" => heading,
        body => format!("{}\n{}", heading, body),
    }
}

fn lenient_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_parses_current_and_legacy_shapes() {
        let current: Index = serde_json::from_value(json!({
            "_id": "ix1",
            "index_name": "Demo",
            "created_at": "2024-05-01T10:00:00Z",
            "models": [{ "model_name": "marengo2.7", "model_options": ["visual", "audio"] }]
        }))
        .unwrap();
        assert_eq!(current.name, "Demo");
        assert_eq!(current.engine_names(), "marengo2.7");
        assert!(current.created_at.is_some());

        let legacy: Index = serde_json::from_value(json!({
            "_id": "ix2",
            "index_name": "Old",
            "engines": [{ "engine_name": "marengo2.6" }],
            "created_at": "not a date"
        }))
        .unwrap();
        assert_eq!(legacy.engine_names(), "marengo2.6");
        assert!(legacy.created_at.is_none());
    }

    #[test]
    fn test_summary_text_shapes() {
        assert_eq!(
            summary_text(&json!({ "id": "s1", "summary": "A talk about Rust." })),
            "A talk about Rust."
        );

        let chapters = json!({
            "id": "s2",
            "chapters": [
                { "chapter_number": 0, "start_sec": 0.0, "end_sec": 65.0,
                  "chapter_title": "Intro", "chapter_summary": "The host opens." },
                { "chapter_number": 1, "start_sec": 65.0, "end_sec": 130.0,
                  "chapter_title": "Demo", "chapter_summary": "" }
            ]
        });
        assert_eq!(
            summary_text(&chapters),
            "[0:00 - 1:05] Intro\nThe host opens.\n\n[1:05 - 2:10] Demo"
        );

        let highlights = json!({
            "highlights": [{
                "start": 12.0,
                "end": 18.5,
                "highlight": "Goal",
                "highlight_summary": "Scored."
            }]
        });
        assert_eq!(summary_text(&highlights), "[0:12 - 0:18] Goal\nScored.");

        assert_eq!(summary_text(&json!({ "id": "s3" })), r#"{"id":"s3"}"#);
    }

    #[test]
    fn test_video_optional_fields() {
        let bare: Video = serde_json::from_value(json!({ "_id": "v1" })).unwrap();
        assert_eq!(bare.filename(), None);
        assert_eq!(bare.duration(), None);
        assert_eq!(bare.video_url(), None);
        assert_eq!(bare.thumbnail_url(), None);

        let full: Video = serde_json::from_value(json!({
            "_id": "v2",
            "system_metadata": { "filename": "talk.mp4", "duration": 125.0 },
            "hls": { "video_url": "https://cdn/v2.m3u8", "thumbnail_urls": ["https://cdn/v2.jpg"] }
        }))
        .unwrap();
        assert_eq!(full.filename(), Some("talk.mp4"));
        assert_eq!(full.duration(), Some(125.0));
        assert_eq!(full.video_url(), Some("https://cdn/v2.m3u8"));
        assert_eq!(full.thumbnail_url(), Some("https://cdn/v2.jpg"));

        let legacy: Video = serde_json::from_value(json!({
            "_id": "v3",
            "metadata": { "filename": "old.mov", "duration": 3.0 }
        }))
        .unwrap();
        assert_eq!(legacy.filename(), Some("old.mov"));
    }

    #[test]
    fn test_search_result_segment() {
        let result: SearchResult = serde_json::from_value(json!({
            "video_id": "v1", "score": 0.812, "start": 12.5, "end": 18.0,
            "transcription": "hello"
        }))
        .unwrap();
        assert_eq!(result.segment(), Some((12.5, 18.0)));
        assert_eq!(result.text.as_deref(), Some("hello"));

        let partial: SearchResult =
            serde_json::from_value(json!({ "video_id": "v1", "start": 1.0 })).unwrap();
        assert_eq!(partial.segment(), None);
    }

    #[test]
    fn test_search_query_validation() {
        let image = QueryImage {
            bytes: vec![1, 2, 3],
            filename: "q.png".to_string(),
            content_type: Some("image/png".to_string()),
        };

        assert!(SearchQuery::new("ix", SearchMode::Text, Some("  ".to_string()), None).is_err());
        assert!(SearchQuery::new("ix", SearchMode::Image, Some("cat".to_string()), None).is_err());

        let text_only =
            SearchQuery::new("ix", SearchMode::Text, Some("cat".to_string()), Some(image.clone()))
                .unwrap();
        assert_eq!(text_only.text.as_deref(), Some("cat"));
        assert!(text_only.image.is_none());

        let multi = SearchQuery::new("ix", SearchMode::Multimodal, None, Some(image)).unwrap();
        assert!(multi.text.is_none());
        assert!(multi.image.is_some());
    }

    #[test]
    fn test_task_terminal_states() {
        let mut task: Task = serde_json::from_value(json!({ "_id": "t1" })).unwrap();
        assert_eq!(task.status(), "unknown");
        assert!(!task.is_terminal());

        task.status = Some("indexing".to_string());
        assert!(!task.is_terminal());
        task.status = Some("failed".to_string());
        assert!(task.is_terminal());
        assert!(!task.is_ready());
        task.status = Some("ready".to_string());
        assert!(task.is_ready());
    }

    #[test]
    fn test_extract_text_fallbacks() {
        assert_eq!(
            extract_text(&json!({ "id": "s", "summary": "Short." }), &["summary", "data"]),
            "Short."
        );
        assert_eq!(
            extract_text(&json!({ "summary": "", "data": "From data" }), &["summary", "data"]),
            "From data"
        );
        assert_eq!(
            extract_text(&json!({ "data": ["a", "b"] }), &["answer", "data"]),
            r#"["a","b"]"#
        );
        assert_eq!(extract_text(&json!({ "id": "x" }), &["answer"]), r#"{"id":"x"}"#);
    }
}
