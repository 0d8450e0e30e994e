//! HTTP surface of the dashboard.
//!
//! Navigation state travels in the query string; the result cache is found
//! through the session cookie. Every mutation answers with a redirect to the
//! next state, so a reload never repeats it.

use super::events::{apply, transcript_key, Event};
use super::pages::{Dashboard, Outcome, SearchInput};
use super::templates::render_html;
use crate::api::QueryImage;
use crate::session::{
    session_cookie, session_id_from_cookie, NavigationState, SessionHandle, SessionStore,
};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Upper bound for a search request carrying a query image.
const MAX_SEARCH_BODY: usize = 20 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    dashboard: Dashboard,
    sessions: SessionStore,
}

type Params = Query<HashMap<String, String>>;

/// Build the dashboard router.
pub fn router(dashboard: Dashboard) -> Router {
    let idle = Duration::from_secs(dashboard.settings().server.session_idle_minutes * 60);
    let state = Arc::new(AppState {
        dashboard,
        sessions: SessionStore::with_idle_timeout(idle),
    });

    Router::new()
        .route("/", get(index))
        .route("/index/select", post(select_index))
        .route(
            "/search",
            post(search).layer(DefaultBodyLimit::max(MAX_SEARCH_BODY)),
        )
        .route("/chat/ask", post(ask))
        .route("/chat/answer", post(answer))
        .route("/chat/clear", post(clear_chat))
        .route("/chat/export", get(export_chat))
        .route("/summary/export", get(export_summary))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The session of one request.
struct Session {
    handle: SessionHandle,
    set_cookie: Option<String>,
}

impl AppState {
    fn session(&self, headers: &HeaderMap) -> Session {
        let existing = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_id_from_cookie);

        let (id, handle, created) = self.sessions.get_or_create(existing);
        if created {
            debug!("Started session {} ({} active)", id, self.sessions.len());
        }

        Session {
            handle,
            set_cookie: created.then(|| session_cookie(id)),
        }
    }
}

impl Session {
    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = &self.set_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("Invalid session cookie: {}", e),
            }
        }
        response
    }
}

fn page_or_redirect(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Page(rendered) => match render_html(&rendered) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("{}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        },
        Outcome::Redirect(nav) => Redirect::to(&nav.href()).into_response(),
    }
}

fn attachment(filename: &str, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let preview = params.get("preview").map(String::as_str);
    let session = state.session(&headers);

    let outcome = {
        let mut cache = session.handle.lock().await;
        state.dashboard.render(&nav, &mut cache, preview).await
    };

    session.respond(page_or_redirect(outcome))
}

#[derive(Deserialize)]
struct SelectIndexForm {
    #[serde(default)]
    index_id: String,
}

async fn select_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SelectIndexForm>,
) -> Response {
    let session = state.session(&headers);
    let next = {
        let mut cache = session.handle.lock().await;
        apply(
            &NavigationState::default(),
            &mut cache,
            Event::SelectIndex(form.index_id),
        )
    };
    session.respond(Redirect::to(&next.href()))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);

    let input = match read_search_form(multipart).await {
        Ok(input) => input,
        Err(e) => {
            warn!("Bad search form: {}", e);
            let message = format!("Invalid search form: {}", e);
            return session.respond((StatusCode::BAD_REQUEST, message));
        }
    };

    session.respond(page_or_redirect(state.dashboard.search(&nav, input).await))
}

async fn read_search_form(mut multipart: Multipart) -> Result<SearchInput, MultipartError> {
    let mut input = SearchInput::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("mode") => {
                let mode = field.text().await?;
                input.mode = mode.parse().unwrap_or_default();
            }
            Some("query") => input.text = Some(field.text().await?),
            Some("image") => {
                let filename = field.file_name().unwrap_or("query.jpg").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    input.image = Some(QueryImage {
                        bytes: bytes.to_vec(),
                        filename,
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

#[derive(Deserialize)]
struct QuestionForm {
    #[serde(default)]
    question: String,
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
    Form(form): Form<QuestionForm>,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);
    let next = {
        let mut cache = session.handle.lock().await;
        state
            .dashboard
            .submit_question(&nav, &mut cache, form.question)
            .await
    };
    session.respond(Redirect::to(&next.href()))
}

async fn answer(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);
    let next = {
        let mut cache = session.handle.lock().await;
        state.dashboard.answer_pending(&nav, &mut cache).await
    };
    session.respond(Redirect::to(&next.href()))
}

async fn clear_chat(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);
    let next = {
        let mut cache = session.handle.lock().await;
        apply(&nav, &mut cache, Event::ClearChat)
    };
    session.respond(Redirect::to(&next.href()))
}

async fn export_chat(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);

    let Some(key) = transcript_key(&nav) else {
        return session.respond((StatusCode::NOT_FOUND, "No video selected"));
    };

    let text = session.handle.lock().await.export_transcript(&key);
    session.respond(attachment(&format!("chat_{}.txt", key.video_id), text))
}

async fn export_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Params,
    headers: HeaderMap,
) -> Response {
    let nav = NavigationState::from_query(&params);
    let session = state.session(&headers);

    let Some(video_id) = nav.active_video() else {
        return session.respond((StatusCode::NOT_FOUND, "No video selected"));
    };

    let summary = session
        .handle
        .lock()
        .await
        .summary(video_id)
        .flatten()
        .map(str::to_string);

    match summary {
        Some(text) => session.respond(attachment(&format!("summary_{}.txt", video_id), text)),
        None => session.respond((StatusCode::NOT_FOUND, "No summary available")),
    }
}
