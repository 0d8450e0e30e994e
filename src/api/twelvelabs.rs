//! Twelve Labs REST client.

use super::models::{
    extract_text, summary_text, CreateIndexRequest, Index, Page, SearchQuery, SearchResult,
    SummaryRequest, Task, UploadRequest, Video,
};
use super::VideoApi;
use crate::config::Settings;
use crate::error::{Result, SnipError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

/// Page size used when listing indexes.
const INDEX_PAGE_LIMIT: u32 = 50;

/// Client for the Twelve Labs video understanding API.
pub struct TwelveLabsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TwelveLabsClient {
    /// Create a client for the given base URL (including version segment).
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.api_key()?;
        Self::new(&settings.api.base_url, &api_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and return the decoded JSON body.
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Value> {
        let response = request
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| SnipError::api(operation, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SnipError::api(operation, e.to_string()))?;

        debug!("{} returned {} ({} bytes)", operation, status, body.len());

        if !status.is_success() {
            return Err(SnipError::Api {
                operation,
                status: Some(status.as_u16()),
                message: error_message(status, &body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| SnipError::api(operation, format!("invalid response body: {}", e)))
    }

    async fn send_typed<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let value = self.send(operation, request).await?;
        serde_json::from_value(value)
            .map_err(|e| SnipError::api(operation, format!("unexpected response shape: {}", e)))
    }
}

/// Prefer the service's own error message over the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

    match message {
        Some(msg) => format!("{} ({})", msg, status),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("HTTP {}: {}", status, body.trim()),
    }
}

fn search_form(query: &SearchQuery) -> Result<Form> {
    let mut form = Form::new()
        .text("index_id", query.index_id.clone())
        .text("page_limit", query.page_limit.to_string())
        .text("threshold", query.threshold.as_str());

    for option in &query.options {
        form = form.text("search_options", option.clone());
    }

    if let Some(text) = &query.text {
        form = form.text("query_text", text.clone());
    }

    if let Some(image) = &query.image {
        let mut part = Part::bytes(image.bytes.clone()).file_name(image.filename.clone());
        if let Some(content_type) = &image.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| SnipError::InvalidInput(format!("bad image type: {}", e)))?;
        }
        form = form
            .text("query_media_type", "image")
            .part("query_media_file", part);
    }

    Ok(form)
}

#[async_trait]
impl VideoApi for TwelveLabsClient {
    #[instrument(skip(self))]
    async fn list_indexes(&self) -> Result<Vec<Index>> {
        let request = self
            .http
            .get(self.url("/indexes"))
            .query(&[("page_limit", INDEX_PAGE_LIMIT)]);
        let page: Page<Index> = self.send_typed("list indexes", request).await?;
        Ok(page.data)
    }

    #[instrument(skip(self))]
    async fn retrieve_index(&self, index_id: &str) -> Result<Index> {
        let request = self.http.get(self.url(&format!("/indexes/{}", index_id)));
        self.send_typed("retrieve index", request).await
    }

    #[instrument(skip(self))]
    async fn list_videos(&self, index_id: &str, page_limit: u32) -> Result<Vec<Video>> {
        let request = self
            .http
            .get(self.url(&format!("/indexes/{}/videos", index_id)))
            .query(&[("page_limit", page_limit)]);
        let page: Page<Video> = self.send_typed("list videos", request).await?;
        Ok(page.data)
    }

    #[instrument(skip(self))]
    async fn retrieve_video(&self, index_id: &str, video_id: &str) -> Result<Video> {
        let request = self
            .http
            .get(self.url(&format!("/indexes/{}/videos/{}", index_id, video_id)));
        self.send_typed("retrieve video", request).await
    }

    #[instrument(skip(self, query), fields(index_id = %query.index_id))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let request = self.http.post(self.url("/search")).multipart(search_form(query)?);
        let page: Page<SearchResult> = self.send_typed("search", request).await?;
        Ok(page.data)
    }

    #[instrument(skip(self, request), fields(video_id = %request.video_id))]
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let http_request = self.http.post(self.url("/summarize")).json(request);
        let value = self.send("summarize", http_request).await?;
        Ok(summary_text(&value))
    }

    #[instrument(skip(self, prompt))]
    async fn analyze(&self, video_id: &str, prompt: &str) -> Result<String> {
        let request = self.http.post(self.url("/analyze")).json(&json!({
            "video_id": video_id,
            "prompt": prompt,
            "stream": false,
        }));
        let value = self.send("analyze", request).await?;
        Ok(extract_text(&value, &["answer", "data"]))
    }

    #[instrument(skip(self, request), fields(name = %request.index_name))]
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Index> {
        let http_request = self.http.post(self.url("/indexes")).json(request);
        let value = self.send("create index", http_request).await?;

        let id = value
            .get("_id")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| SnipError::api("create index", format!("no index id in {}", value)))?;

        Ok(Index {
            id: id.to_string(),
            name: request.index_name.clone(),
            created_at: None,
            engines: request.models.clone(),
        })
    }

    #[instrument(skip(self, request), fields(path = %request.path.display()))]
    async fn create_task(&self, request: &UploadRequest<'_>) -> Result<Task> {
        const OPERATION: &str = "create task";

        let file = tokio::fs::File::open(request.path).await.map_err(|e| {
            SnipError::api(OPERATION, format!("cannot open {}: {}", request.path.display(), e))
        })?;
        let length = file
            .metadata()
            .await
            .map_err(|e| SnipError::api(OPERATION, e.to_string()))?
            .len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let file_name = request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();

        let mut form = Form::new()
            .text("index_id", request.index_id.to_string())
            .part(
                "video_file",
                Part::stream_with_length(body, length).file_name(file_name),
            );
        if let Some(language) = request.language {
            form = form.text("language", language.to_string());
        }

        let http_request = self.http.post(self.url("/tasks")).multipart(form);
        self.send_typed(OPERATION, http_request).await
    }

    #[instrument(skip(self))]
    async fn retrieve_task(&self, task_id: &str) -> Result<Task> {
        let request = self.http.get(self.url(&format!("/tasks/{}", task_id)));
        self.send_typed("retrieve task", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{QueryImage, SearchMode, Threshold};
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TwelveLabsClient {
        TwelveLabsClient::new(&format!("{}/v1.3/", server.uri()), "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_list_indexes_sends_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.3/indexes"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "_id": "ix1", "index_name": "Talks", "models": [{ "model_name": "marengo2.7" }] },
                    { "_id": "ix2", "index_name": "Empty" }
                ],
                "page_info": { "page": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let indexes = client(&server).list_indexes().await.unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].id, "ix1");
        assert_eq!(indexes[0].engine_names(), "marengo2.7");
        assert!(indexes[1].engines.is_empty());
    }

    #[tokio::test]
    async fn test_list_videos_passes_page_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.3/indexes/ix1/videos"))
            .and(query_param("page_limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "_id": "v1", "system_metadata": { "filename": "a.mp4", "duration": 125.0 } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let videos = client(&server).list_videos("ix1", 50).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].duration(), Some(125.0));
    }

    #[tokio::test]
    async fn test_http_error_carries_operation_and_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.3/indexes/gone/videos/v9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "video_not_found",
                "message": "The video does not exist."
            })))
            .mount(&server)
            .await;

        let err = client(&server).retrieve_video("gone", "v9").await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            SnipError::Api { operation, message, .. } => {
                assert_eq!(operation, "retrieve video");
                assert!(message.contains("The video does not exist."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.3/indexes"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).list_indexes().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "list indexes failed: HTTP 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_search_posts_multipart_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/search"))
            .and(body_string_contains("person walking"))
            .and(body_string_contains("search_options"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "video_id": "v1", "score": 0.812, "start": 12.5, "end": 18.0, "confidence": "high" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::new("ix1", SearchMode::Text, Some("person walking".into()), None)
            .unwrap()
            .with_threshold(Threshold::Low);
        let results = client(&server).search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].segment(), Some((12.5, 18.0)));
        assert_eq!(results[0].confidence.as_deref(), Some("high"));
    }

    #[tokio::test]
    async fn test_summarize_falls_back_to_raw_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/summarize"))
            .and(body_json(json!({ "video_id": "v1", "type": "summary" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s1" })))
            .mount(&server)
            .await;

        let request = SummaryRequest {
            video_id: "v1".to_string(),
            summary_type: "summary".to_string(),
            prompt: None,
        };
        let text = client(&server).summarize(&request).await.unwrap();
        assert_eq!(text, r#"{"id":"s1"}"#);
    }

    #[tokio::test]
    async fn test_analyze_reads_data_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/analyze"))
            .and(body_json(json!({ "video_id": "v1", "prompt": "What is this?", "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "g1",
                "data": "A cooking show."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client(&server).analyze("v1", "What is this?").await.unwrap();
        assert_eq!(answer, "A cooking show.");
    }

    #[tokio::test]
    async fn test_create_index_returns_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/indexes"))
            .and(body_string_contains("\"index_name\":\"My Videos\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "ix-new" })))
            .mount(&server)
            .await;

        let request = CreateIndexRequest::new("My Videos", &["marengo2.7".to_string()]);
        let index = client(&server).create_index(&request).await.unwrap();
        assert_eq!(index.id, "ix-new");
        assert_eq!(index.name, "My Videos");
    }

    #[tokio::test]
    async fn test_create_task_uploads_file() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        Mock::given(method("POST"))
            .and(path("/v1.3/tasks"))
            .and(body_string_contains("clip.mp4"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "_id": "t1", "video_id": "v1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = UploadRequest {
            index_id: "ix1",
            path: &video,
            language: Some("en"),
        };
        let task = client(&server).create_task(&request).await.unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.video_id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_list_indexes_without_data_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.3/indexes"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "page_info": { "page": 1 } })),
            )
            .mount(&server)
            .await;

        let indexes = client(&server).list_indexes().await.unwrap();
        assert!(indexes.is_empty());
    }

    #[tokio::test]
    async fn test_image_search_sends_media_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/search"))
            .and(body_string_contains("name=\"query_media_type\""))
            .and(body_string_contains("image"))
            .and(body_string_contains("name=\"query_media_file\"; filename=\"frame.png\""))
            .and(body_string_contains("PNGDATA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "video_id": "v2", "score": 0.5, "start": 1.0, "end": 2.0 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = QueryImage {
            bytes: b"PNGDATA".to_vec(),
            filename: "frame.png".to_string(),
            content_type: Some("image/png".to_string()),
        };
        let query = SearchQuery::new("ix1", SearchMode::Image, None, Some(image)).unwrap();
        let results = client(&server).search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].video_id, "v2");
    }

    #[tokio::test]
    async fn test_multimodal_search_sends_text_and_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.3/search"))
            .and(body_string_contains("name=\"query_text\""))
            .and(body_string_contains("red car"))
            .and(body_string_contains("name=\"query_media_file\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let image = QueryImage {
            bytes: b"JPG".to_vec(),
            filename: "car.jpg".to_string(),
            content_type: None,
        };
        let query = SearchQuery::new(
            "ix1",
            SearchMode::Multimodal,
            Some("red car".to_string()),
            Some(image),
        )
        .unwrap();
        let results = client(&server).search(&query).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_create_task_missing_file_is_api_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");

        let request = UploadRequest {
            index_id: "ix1",
            path: &missing,
            language: None,
        };
        let err = client(&server).create_task(&request).await.unwrap_err();
        match err {
            SnipError::Api { operation, status, message } => {
                assert_eq!(operation, "create task");
                assert_eq!(status, None);
                assert!(message.contains("missing.mp4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_error_message_prefers_service_message() {
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid API key"}"#),
            "Invalid API key (401 Unauthorized)"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "plain text"),
            "HTTP 400 Bad Request: plain text"
        );
    }
}
