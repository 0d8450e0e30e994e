//! User events and the state transitions they cause.
//!
//! An event maps the current (navigation, cache) pair to the next one.
//! Navigation events touch no cache, so pages render them as links to the
//! state they produce. Events that need the external API (answering a
//! question) live on [`Dashboard`](super::Dashboard).

use crate::session::{NavigationState, Page, ResultCache, TranscriptKey};
use tracing::debug;

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Pick an index from the picker.
    SelectIndex(String),
    /// Go back to the index picker.
    ChangeIndex,
    /// Switch tab, optionally opening a video panel.
    Navigate { page: Page, video_id: Option<String> },
    /// Leave a video panel for the grid.
    CloseVideo,
    /// Ask a question about the active video.
    SubmitQuestion(String),
    /// Empty the active video's transcript.
    ClearChat,
}

impl Event {
    /// Navigation state after this event. Cache effects are left to [`apply`].
    pub fn next_state(&self, nav: &NavigationState) -> NavigationState {
        let mut next = nav.clone();
        match self {
            Event::SelectIndex(index_id) => next.select_index(index_id),
            Event::ChangeIndex => next.clear(),
            Event::Navigate { page, video_id } => next.navigate(*page, None, video_id.as_deref()),
            Event::CloseVideo => next.clear_video(),
            Event::SubmitQuestion(_) | Event::ClearChat => {}
        }
        next
    }
}

/// Transcript key for the active video, if one is open.
pub fn transcript_key(nav: &NavigationState) -> Option<TranscriptKey> {
    match (nav.active_index(), nav.active_video()) {
        (Some(index_id), Some(video_id)) => Some(TranscriptKey::new(index_id, video_id)),
        _ => None,
    }
}

/// Apply `event`, returning the navigation state to redirect to.
pub fn apply(nav: &NavigationState, cache: &mut ResultCache, event: Event) -> NavigationState {
    let next = event.next_state(nav);

    match event {
        Event::SubmitQuestion(question) => {
            if let Some(key) = transcript_key(nav) {
                if let Err(e) = cache.append_question(&key, &question) {
                    debug!("Question not added: {}", e);
                }
            }
        }
        Event::ClearChat => {
            if let Some(key) = transcript_key(nav) {
                cache.clear(&key);
            }
        }
        _ => {}
    }

    next
}
