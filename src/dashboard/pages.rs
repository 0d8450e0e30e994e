//! Page orchestration: fetch what the current state needs, fill the cache,
//! and build the view model.
//!
//! External failures never abort a render. Each call site turns its error
//! into an inline message and a fallback value.

use super::events::{apply, transcript_key, Event};
use super::views::{
    ChatEntryView, ChatView, IndexOption, IndexPickerView, IndexPreview, PageView, Rendered,
    SearchResultView, SearchView, ShellView, SummaryView, VideoGridView, VideoPanel,
};
use crate::api::{Index, QueryImage, SearchMode, SearchQuery, SummaryRequest, Video, VideoApi};
use crate::config::Settings;
use crate::session::{NavigationState, Page, ResultCache, Screen};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of handling a request.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Show this page.
    Page(Rendered),
    /// The state changed; send the browser here.
    Redirect(NavigationState),
}

/// Inputs of the search form.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    pub mode: SearchMode,
    pub text: Option<String>,
    pub image: Option<QueryImage>,
}

/// The dashboard application, independent of the HTTP layer.
pub struct Dashboard {
    api: Arc<dyn VideoApi>,
    settings: Settings,
}

impl Dashboard {
    pub fn new(api: Arc<dyn VideoApi>, settings: Settings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Render the screen for `nav`.
    ///
    /// `preview` highlights an index on the picker.
    pub async fn render(
        &self,
        nav: &NavigationState,
        cache: &mut ResultCache,
        preview: Option<&str>,
    ) -> Outcome {
        let page = match nav.screen() {
            Screen::IndexPicker => return Outcome::Page(self.index_picker(preview).await),
            Screen::Tab(page) => page,
        };

        let mut nav = nav.clone();
        let index = match self.resolve_index(&mut nav).await {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };

        match page {
            Page::Search => {
                let view = SearchView::form(&nav, SearchMode::default(), "");
                Outcome::Page(Rendered {
                    shell: ShellView::for_tab(&nav, &index, "Search"),
                    body: PageView::Search(view),
                })
            }
            Page::Videos | Page::Chat => Outcome::Page(self.video_tab(&nav, &index, cache).await),
        }
    }

    /// Run one search and render the results. Searches are never cached.
    pub async fn search(&self, nav: &NavigationState, input: SearchInput) -> Outcome {
        let mut nav = nav.clone();
        nav.navigate(Page::Search, None, None);

        let index = match self.resolve_index(&mut nav).await {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };

        let shell = ShellView::for_tab(&nav, &index, "Search");
        let mut view = SearchView::form(&nav, input.mode, input.text.as_deref().unwrap_or(""));

        let query = match SearchQuery::new(&index.id, input.mode, input.text, input.image) {
            Ok(query) => query
                .with_options(self.settings.search.options.clone())
                .with_page_limit(self.settings.search.page_limit)
                .with_threshold(self.settings.search.threshold),
            Err(e) => {
                view.error = Some(e.to_string());
                return Outcome::Page(Rendered {
                    shell,
                    body: PageView::Search(view),
                });
            }
        };

        view.searched = true;
        let started = Instant::now();
        match self.api.search(&query).await {
            Ok(results) => {
                let elapsed = started.elapsed();
                info!("Search returned {} results in {:?}", results.len(), elapsed);
                view.elapsed = Some(format!(
                    "Search completed in {:.2} seconds",
                    elapsed.as_secs_f64()
                ));

                // One lookup per distinct video; a failed lookup only loses the player.
                let mut videos: HashMap<String, Option<Video>> = HashMap::new();
                for result in &results {
                    if videos.contains_key(&result.video_id) {
                        continue;
                    }
                    let video = match self.api.retrieve_video(&index.id, &result.video_id).await {
                        Ok(video) => Some(video),
                        Err(e) => {
                            warn!("Could not load video {}: {}", result.video_id, e);
                            None
                        }
                    };
                    videos.insert(result.video_id.clone(), video);
                }

                view.results = results
                    .iter()
                    .enumerate()
                    .map(|(i, result)| {
                        let video = videos.get(&result.video_id).and_then(Option::as_ref);
                        SearchResultView::new(&nav, i + 1, result, video)
                    })
                    .collect();
            }
            Err(e) => {
                warn!("{}", e);
                view.error = Some(format!("Search failed: {}", e));
            }
        }

        Outcome::Page(Rendered {
            shell,
            body: PageView::Search(view),
        })
    }

    /// Queue a chat question for the active video.
    ///
    /// Returns the state to redirect to. A stale selection is reset and the
    /// question dropped.
    pub async fn submit_question(
        &self,
        nav: &NavigationState,
        cache: &mut ResultCache,
        question: String,
    ) -> NavigationState {
        if let Err(next) = self.verify_selection(nav).await {
            return next;
        }
        apply(nav, cache, Event::SubmitQuestion(question))
    }

    /// Answer the pending question of the active transcript, if any.
    ///
    /// Returns the state to redirect to.
    pub async fn answer_pending(
        &self,
        nav: &NavigationState,
        cache: &mut ResultCache,
    ) -> NavigationState {
        if let Err(next) = self.verify_selection(nav).await {
            return next;
        }
        let Some(key) = transcript_key(nav) else {
            return nav.clone();
        };
        let Some(question) = cache.pending_question(&key).map(str::to_string) else {
            debug!("No pending question for {:?}", key);
            return nav.clone();
        };

        let prompt = cache.context_prompt(&key, &question, self.settings.chat.context_turns);

        let started = Instant::now();
        match self.api.analyze(&key.video_id, &prompt).await {
            Ok(answer) => {
                cache.resolve_pending(&key, &answer, started.elapsed());
            }
            Err(e) => {
                warn!("{}", e);
                cache.fail_pending(&key, &e.to_string());
            }
        }

        nav.clone()
    }

    /// Check the active index and video still exist before acting on them.
    ///
    /// On failure returns the state to go to instead: the picker for a
    /// stale index, the grid for a stale video, the same state (which
    /// renders the error) when a lookup fails.
    async fn verify_selection(&self, nav: &NavigationState) -> Result<(), NavigationState> {
        let mut next = nav.clone();
        match self.resolve_index(&mut next).await {
            Ok(_) => {}
            Err(Outcome::Redirect(picker)) => return Err(picker),
            Err(Outcome::Page(_)) => return Err(nav.clone()),
        }

        let Some(index_id) = next.active_index().map(str::to_string) else {
            return Err(next);
        };
        let videos = match self
            .api
            .list_videos(&index_id, self.settings.indexing.video_page_limit)
            .await
        {
            Ok(videos) => videos,
            Err(e) => {
                warn!("{}", e);
                return Err(nav.clone());
            }
        };

        if next.reconcile_video(&videos) {
            info!("Selected video no longer exists, returning to video list");
            return Err(next);
        }
        Ok(())
    }

    /// Check the active index still exists.
    ///
    /// A stale id redirects to the picker; a failed lookup shows the picker
    /// with the error.
    async fn resolve_index(&self, nav: &mut NavigationState) -> Result<Index, Outcome> {
        let indexes = match self.api.list_indexes().await {
            Ok(indexes) => indexes,
            Err(e) => {
                warn!("{}", e);
                let view = IndexPickerView {
                    error: Some(format!("Failed to validate index: {}", e)),
                    ..Default::default()
                };
                return Err(Outcome::Page(Rendered {
                    shell: ShellView::picker(),
                    body: PageView::IndexPicker(view),
                }));
            }
        };

        match nav.reconcile_index(&indexes) {
            Some(index) => Ok(index.clone()),
            None => {
                info!("Selected index no longer exists, returning to picker");
                Err(Outcome::Redirect(nav.clone()))
            }
        }
    }

    async fn index_picker(&self, preview: Option<&str>) -> Rendered {
        let shell = ShellView::picker();

        let indexes = match self.api.list_indexes().await {
            Ok(indexes) => indexes,
            Err(e) => {
                warn!("{}", e);
                return Rendered {
                    shell,
                    body: PageView::IndexPicker(IndexPickerView {
                        error: Some(format!("Failed to load indexes: {}", e)),
                        ..Default::default()
                    }),
                };
            }
        };

        let highlighted = preview
            .and_then(|id| indexes.iter().find(|idx| idx.id == id))
            .or_else(|| indexes.first());

        let preview = match highlighted {
            Some(index) => Some(
                match self
                    .api
                    .list_videos(&index.id, self.settings.indexing.video_page_limit)
                    .await
                {
                    Ok(videos) => IndexPreview::from_videos(&index.id, &videos),
                    Err(e) => IndexPreview::failed(&index.id, &e.to_string()),
                },
            ),
            None => None,
        };

        let options = indexes
            .iter()
            .map(|idx| IndexOption::new(idx, highlighted.is_some_and(|h| h.id == idx.id)))
            .collect();

        Rendered {
            shell,
            body: PageView::IndexPicker(IndexPickerView {
                indexes: options,
                preview,
                error: None,
            }),
        }
    }

    /// The videos and chat tabs: a grid, or a panel for the active video.
    async fn video_tab(
        &self,
        nav: &NavigationState,
        index: &Index,
        cache: &mut ResultCache,
    ) -> Rendered {
        let page = nav.page();
        let mut shell = ShellView::for_tab(nav, index, page.label());

        let videos = match self
            .api
            .list_videos(&index.id, self.settings.indexing.video_page_limit)
            .await
        {
            Ok(videos) => videos,
            Err(e) => {
                warn!("{}", e);
                return Rendered {
                    shell,
                    body: PageView::VideoGrid(VideoGridView::failed(&e.to_string())),
                };
            }
        };

        if videos.is_empty() {
            return Rendered {
                shell,
                body: PageView::VideoGrid(VideoGridView::empty(nav)),
            };
        }

        let mut nav = nav.clone();
        if nav.reconcile_video(&videos) {
            shell = shell.with_notice("Selected video not found. Returning to video list.");
        }

        let video = match nav
            .active_video()
            .and_then(|id| videos.iter().find(|v| v.id == id))
        {
            Some(video) => video,
            None => {
                return Rendered {
                    shell,
                    body: PageView::VideoGrid(VideoGridView::new(&nav, &videos)),
                }
            }
        };

        let body = match page {
            Page::Chat => PageView::Chat(self.chat_panel(&nav, video, cache)),
            _ => PageView::Summary(self.summary_panel(&nav, video, cache).await),
        };

        Rendered { shell, body }
    }

    async fn summary_panel(
        &self,
        nav: &NavigationState,
        video: &Video,
        cache: &mut ResultCache,
    ) -> SummaryView {
        let request = SummaryRequest {
            video_id: video.id.clone(),
            summary_type: self.settings.summary.summary_type.clone(),
            prompt: self.settings.summary.prompt.clone(),
        };
        let api = &self.api;

        let summary = cache
            .get_or_create_summary(&video.id, || async move { api.summarize(&request).await })
            .await;

        SummaryView {
            video: VideoPanel::new(nav, video),
            summary,
            export_href: nav.href_for("/summary/export"),
        }
    }

    fn chat_panel(&self, nav: &NavigationState, video: &Video, cache: &ResultCache) -> ChatView {
        let entries: Vec<ChatEntryView> = transcript_key(nav)
            .map(|key| cache.transcript(&key).iter().map(ChatEntryView::from).collect())
            .unwrap_or_default();

        let pending = entries.last().is_some_and(|e| e.pending);
        let suggestions = if entries.is_empty() {
            self.settings.chat.suggestions.clone()
        } else {
            Vec::new()
        };

        ChatView {
            video: VideoPanel::new(nav, video),
            entries,
            pending,
            suggestions,
            ask_action: nav.href_for("/chat/ask"),
            answer_action: nav.href_for("/chat/answer"),
            clear_action: nav.href_for("/chat/clear"),
            export_href: nav.href_for("/chat/export"),
        }
    }
}
