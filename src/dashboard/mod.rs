//! The browser dashboard: index picker, search, summaries and chat.

mod events;
mod pages;
mod server;
mod templates;
#[cfg(test)]
mod testing;
mod views;

pub use events::{apply, transcript_key, Event};
pub use pages::{Dashboard, Outcome, SearchInput};
pub use server::{router, AppState};
pub use templates::render_html;
pub use views::{PageView, Rendered, ShellView};
