//! Per-session state: navigation (in the URL) and the result cache (in memory).

mod cache;
mod navigation;
mod store;

pub use cache::{Answer, ChatEntry, ResultCache, TranscriptKey};
pub use navigation::{NavigationState, Page, Screen};
pub use store::{
    session_cookie, session_id_from_cookie, SessionHandle, SessionStore, SESSION_COOKIE,
};
