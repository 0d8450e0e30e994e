//! View models: plain data the templates render.
//!
//! Everything here is computed from API data and session state; templates
//! only lay it out.

use super::events::Event;
use crate::api::{Index, SearchMode, SearchResult, Video};
use crate::session::{Answer, ChatEntry, NavigationState, Page};
use std::path::Path;
use std::time::Duration;

/// Longest file name shown before truncation.
const MAX_NAME_CHARS: usize = 50;

/// A complete page: the shared chrome plus one screen.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub shell: ShellView,
    pub body: PageView,
}

/// The screen being shown.
#[derive(Debug, Clone)]
pub enum PageView {
    IndexPicker(IndexPickerView),
    Search(SearchView),
    VideoGrid(VideoGridView),
    Summary(SummaryView),
    Chat(ChatView),
}

/// Chrome shared by every screen.
#[derive(Debug, Clone, Default)]
pub struct ShellView {
    pub title: String,
    pub index_name: Option<String>,
    pub nav_links: Vec<NavLink>,
    pub change_index_href: String,
    /// Soft, informational message (e.g. a stale selection was reset).
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NavLink {
    pub label: String,
    pub href: String,
    pub active: bool,
}

impl ShellView {
    /// Chrome for the index picker.
    pub fn picker() -> Self {
        Self {
            title: "Choose an index".to_string(),
            change_index_href: "/".to_string(),
            ..Default::default()
        }
    }

    /// Chrome for a tab of the selected index.
    pub fn for_tab(nav: &NavigationState, index: &Index, title: &str) -> Self {
        let nav_links = Page::ALL
            .iter()
            .map(|page| NavLink {
                label: page.label().to_string(),
                href: Event::Navigate {
                    page: *page,
                    video_id: None,
                }
                .next_state(nav)
                .href(),
                active: *page == nav.page(),
            })
            .collect();

        Self {
            title: title.to_string(),
            index_name: Some(index.name.clone()),
            nav_links,
            change_index_href: Event::ChangeIndex.next_state(nav).href(),
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

// === Index picker ===

#[derive(Debug, Clone, Default)]
pub struct IndexPickerView {
    pub indexes: Vec<IndexOption>,
    pub preview: Option<IndexPreview>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexOption {
    pub id: String,
    pub label: String,
    pub created: String,
    pub engines: String,
    pub preview_href: String,
    pub selected: bool,
}

impl IndexOption {
    pub fn new(index: &Index, selected: bool) -> Self {
        Self {
            id: index.id.clone(),
            label: format!("{} ({})", index.name, index.id),
            created: index
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            engines: index.engine_names(),
            preview_href: format!("/?preview={}", urlencode(&index.id)),
            selected,
        }
    }
}

/// First few videos of the highlighted index.
#[derive(Debug, Clone, Default)]
pub struct IndexPreview {
    pub index_id: String,
    pub total: usize,
    pub names: Vec<String>,
    pub more: usize,
    pub upload_hint: Option<String>,
    pub error: Option<String>,
}

impl IndexPreview {
    const SHOWN: usize = 3;

    pub fn from_videos(index_id: &str, videos: &[Video]) -> Self {
        let names: Vec<String> = videos.iter().take(Self::SHOWN).map(display_name).collect();
        Self {
            index_id: index_id.to_string(),
            total: videos.len(),
            more: videos.len().saturating_sub(names.len()),
            names,
            upload_hint: videos.is_empty().then(|| upload_hint(index_id)),
            error: None,
        }
    }

    pub fn failed(index_id: &str, error: &str) -> Self {
        Self {
            index_id: index_id.to_string(),
            error: Some(format!("Error loading videos: {}", error)),
            ..Default::default()
        }
    }
}

// === Search ===

#[derive(Debug, Clone)]
pub struct SearchView {
    pub action: String,
    pub query: String,
    pub modes: Vec<ModeOption>,
    pub searched: bool,
    pub results: Vec<SearchResultView>,
    pub elapsed: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModeOption {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

impl SearchView {
    /// An empty search form.
    pub fn form(nav: &NavigationState, mode: SearchMode, query: &str) -> Self {
        let modes = [
            (SearchMode::Text, "Text Search"),
            (SearchMode::Image, "Image Search"),
            (SearchMode::Multimodal, "Multimodal Search"),
        ]
        .into_iter()
        .map(|(m, label)| ModeOption {
            value: m.to_string(),
            label: label.to_string(),
            checked: m == mode,
        })
        .collect();

        Self {
            action: nav.href_for("/search"),
            query: query.to_string(),
            modes,
            searched: false,
            results: Vec::new(),
            elapsed: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultView {
    pub rank: usize,
    pub file: String,
    pub video_id_short: String,
    pub time_label: Option<String>,
    pub confidence: String,
    pub level: Option<String>,
    pub text: Option<String>,
    pub player_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub view_href: String,
}

impl SearchResultView {
    /// `video` is the full video record when it could be retrieved.
    pub fn new(
        nav: &NavigationState,
        rank: usize,
        result: &SearchResult,
        video: Option<&Video>,
    ) -> Self {
        let player_url = video.and_then(Video::video_url).map(|url| match result.start {
            Some(start) => format!("{}#t={}", url, start.max(0.0).floor()),
            None => url.to_string(),
        });

        Self {
            rank,
            file: video
                .map(display_name)
                .unwrap_or_else(|| result.video_id.clone()),
            video_id_short: short_id(&result.video_id, 16),
            time_label: result.segment().map(|(s, e)| segment_label(s, e)),
            confidence: result
                .score
                .map(format_score)
                .unwrap_or_else(|| "n/a".to_string()),
            level: result.confidence.clone(),
            text: result.text.clone().filter(|t| !t.trim().is_empty()),
            player_url,
            thumbnail_url: result
                .thumbnail_url
                .clone()
                .or_else(|| video.and_then(Video::thumbnail_url).map(str::to_string)),
            view_href: Event::Navigate {
                page: Page::Videos,
                video_id: Some(result.video_id.clone()),
            }
            .next_state(nav)
            .href(),
        }
    }
}

// === Video grid and panels ===

#[derive(Debug, Clone, Default)]
pub struct VideoGridView {
    pub cards: Vec<VideoCard>,
    pub action_label: String,
    pub empty_message: Option<String>,
    pub upload_hint: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoCard {
    pub name: String,
    pub duration: String,
    pub short_id: String,
    pub thumbnail_url: Option<String>,
    pub href: String,
}

impl VideoGridView {
    pub fn new(nav: &NavigationState, videos: &[Video]) -> Self {
        let page = nav.page();
        let action_label = match page {
            Page::Chat => "Chat About This Video",
            _ => "Summarize This Video",
        };

        if videos.is_empty() {
            return Self::empty(nav);
        }

        Self {
            cards: videos
                .iter()
                .map(|v| VideoCard {
                    name: display_name(v),
                    duration: v
                        .duration()
                        .map(format_clock)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    short_id: short_id(&v.id, 8),
                    thumbnail_url: v.thumbnail_url().map(str::to_string),
                    href: Event::Navigate {
                        page,
                        video_id: Some(v.id.clone()),
                    }
                    .next_state(nav)
                    .href(),
                })
                .collect(),
            action_label: action_label.to_string(),
            ..Default::default()
        }
    }

    /// The index has no videos.
    pub fn empty(nav: &NavigationState) -> Self {
        Self {
            empty_message: Some(
                "No videos found in this index. Upload some videos first.".to_string(),
            ),
            upload_hint: nav.active_index().map(upload_hint),
            ..Default::default()
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            error: Some(format!("Failed to load videos: {}", error)),
            ..Default::default()
        }
    }
}

/// Player column shared by the summary and chat panels.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPanel {
    pub name: String,
    pub player_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: String,
    pub back_href: String,
}

impl VideoPanel {
    pub fn new(nav: &NavigationState, video: &Video) -> Self {
        let caption = match video.duration() {
            Some(d) => format!("Duration: {} | Video ID: {}", format_clock(d), video.id),
            None => format!("Video ID: {}", video.id),
        };

        Self {
            name: display_name(video),
            player_url: video.video_url().map(str::to_string),
            thumbnail_url: video.thumbnail_url().map(str::to_string),
            caption,
            back_href: Event::CloseVideo.next_state(nav).href(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryView {
    pub video: VideoPanel,
    pub summary: Option<String>,
    pub export_href: String,
}

#[derive(Debug, Clone)]
pub struct ChatView {
    pub video: VideoPanel,
    pub entries: Vec<ChatEntryView>,
    pub pending: bool,
    pub suggestions: Vec<String>,
    pub ask_action: String,
    pub answer_action: String,
    pub clear_action: String,
    pub export_href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntryView {
    pub question: String,
    pub answer: String,
    pub latency: String,
    pub pending: bool,
    pub failed: bool,
}

impl From<&ChatEntry> for ChatEntryView {
    fn from(entry: &ChatEntry) -> Self {
        let (answer, latency, pending, failed) = match &entry.answer {
            Answer::Pending => ("Thinking...".to_string(), "Loading...".to_string(), true, false),
            Answer::Answered { text, latency } => {
                (text.clone(), format_latency(*latency), false, false)
            }
            Answer::Failed { message } => {
                (format!("Error: {}", message), "Error".to_string(), false, true)
            }
        };
        Self {
            question: entry.question.clone(),
            answer,
            latency,
            pending,
            failed,
        }
    }
}

// === Formatting ===

/// `m:ss`, truncating fractional seconds.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// `m:ss - m:ss` for a matched segment.
pub fn segment_label(start: f64, end: f64) -> String {
    format!("{} - {}", format_clock(start), format_clock(end))
}

pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

pub fn format_latency(latency: Duration) -> String {
    format!("{:.1}s", latency.as_secs_f64())
}

/// File name without extension, truncated; the video id when unknown.
pub fn display_name(video: &Video) -> String {
    let stem = video
        .filename()
        .map(|f| {
            Path::new(f)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(f)
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| video.id.clone());
    truncate(&stem, MAX_NAME_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn short_id(id: &str, chars: usize) -> String {
    truncate(id, chars)
}

fn upload_hint(index_id: &str) -> String {
    format!("snippetropolis upload-video {} path/to/video.mp4", index_id)
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
