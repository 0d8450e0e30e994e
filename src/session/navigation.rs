//! Navigation state carried in the URL query string.
//!
//! The state survives a page refresh because it lives in the URL, and every
//! mutation produces a new URL the browser is redirected to.

use crate::api::{Index, Video};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::form_urlencoded;

/// Dashboard tabs shown once an index is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Search,
    Videos,
    Chat,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Search, Page::Videos, Page::Chat];

    /// Parse a query value; unknown values resolve to `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "search" => Some(Page::Search),
            "videos" | "summary" => Some(Page::Videos),
            "chat" | "qa" => Some(Page::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Search => "search",
            Page::Videos => "videos",
            Page::Chat => "chat",
        }
    }

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            Page::Search => "Search",
            Page::Videos => "Summarize",
            Page::Chat => "Chat",
        }
    }

    /// Pages that show a per-video panel when a video id is present.
    pub fn is_video_scoped(&self) -> bool {
        matches!(self, Page::Videos | Page::Chat)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the dashboard shows, derived from the navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No index selected.
    IndexPicker,
    /// An index is selected; the tab decides the rest.
    Tab(Page),
}

/// The active page and entities for one browser tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    page: Page,
    index_id: Option<String>,
    video_id: Option<String>,
}

impl NavigationState {
    pub fn new(page: Page, index_id: Option<String>, video_id: Option<String>) -> Self {
        let mut state = Self {
            page,
            index_id: non_empty(index_id),
            video_id: None,
        };
        if page.is_video_scoped() {
            state.video_id = non_empty(video_id);
        }
        state
    }

    /// Decode from query parameters. Absent or unknown values fall back to defaults.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let page = params
            .get("page")
            .and_then(|p| Page::parse(p))
            .unwrap_or_default();
        Self::new(
            page,
            params.get("index_id").cloned(),
            params.get("video_id").cloned(),
        )
    }

    /// Decode from a raw query string (without the leading `?`).
    pub fn from_query_str(query: &str) -> Self {
        let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self::from_query(&params)
    }

    /// Encode as a query string. The index picker state encodes as empty.
    pub fn to_query(&self) -> String {
        let Some(index_id) = &self.index_id else {
            return String::new();
        };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("page", self.page.as_str());
        serializer.append_pair("index_id", index_id);
        if let Some(video_id) = &self.video_id {
            serializer.append_pair("video_id", video_id);
        }
        serializer.finish()
    }

    /// Dashboard URL for this state.
    pub fn href(&self) -> String {
        self.href_for("/")
    }

    /// URL for `path` carrying this state.
    pub fn href_for(&self, path: &str) -> String {
        let query = self.to_query();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn active_index(&self) -> Option<&str> {
        self.index_id.as_deref()
    }

    pub fn active_video(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn screen(&self) -> Screen {
        match self.index_id {
            None => Screen::IndexPicker,
            Some(_) => Screen::Tab(self.page),
        }
    }

    /// Move to `page`. A given `index_id` replaces the active index; the video
    /// id is kept only for video-scoped pages.
    pub fn navigate(&mut self, page: Page, index_id: Option<&str>, video_id: Option<&str>) {
        self.page = page;
        if let Some(id) = index_id.filter(|id| !id.is_empty()) {
            self.index_id = Some(id.to_string());
        }
        self.video_id = if page.is_video_scoped() {
            video_id.filter(|id| !id.is_empty()).map(str::to_string)
        } else {
            None
        };
    }

    /// Select an index, starting from its default tab.
    pub fn select_index(&mut self, index_id: &str) {
        *self = Self::new(Page::default(), Some(index_id.to_string()), None);
    }

    pub fn clear_video(&mut self) {
        self.video_id = None;
    }

    /// Return to the index picker.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reset to the picker if the active index no longer exists.
    ///
    /// Returns the index when it is valid.
    pub fn reconcile_index<'a>(&mut self, indexes: &'a [Index]) -> Option<&'a Index> {
        let id = self.index_id.as_deref()?;
        let found = indexes.iter().find(|idx| idx.id == id);
        if found.is_none() {
            self.clear();
        }
        found
    }

    /// Clear the active video if the index does not contain it.
    ///
    /// Returns true when a stale video id was dropped.
    pub fn reconcile_video(&mut self, videos: &[Video]) -> bool {
        match self.video_id.as_deref() {
            Some(id) if !videos.iter().any(|v| v.id == id) => {
                self.clear_video();
                true
            }
            _ => false,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
