//! HTML rendering of view models.

use super::views::{
    ChatView, IndexPickerView, PageView, Rendered, SearchView, ShellView, SummaryView,
    VideoGridView,
};
use crate::error::Result;
use askama::Template;

#[derive(Template)]
#[template(path = "index_picker.html")]
struct IndexPickerTemplate<'a> {
    shell: &'a ShellView,
    view: &'a IndexPickerView,
}

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate<'a> {
    shell: &'a ShellView,
    view: &'a SearchView,
}

#[derive(Template)]
#[template(path = "video_grid.html")]
struct VideoGridTemplate<'a> {
    shell: &'a ShellView,
    view: &'a VideoGridView,
}

#[derive(Template)]
#[template(path = "summary.html")]
struct SummaryTemplate<'a> {
    shell: &'a ShellView,
    view: &'a SummaryView,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate<'a> {
    shell: &'a ShellView,
    view: &'a ChatView,
}

/// Render a page to HTML.
pub fn render_html(rendered: &Rendered) -> Result<String> {
    let shell = &rendered.shell;
    let html = match &rendered.body {
        PageView::IndexPicker(view) => IndexPickerTemplate { shell, view }.render()?,
        PageView::Search(view) => SearchTemplate { shell, view }.render()?,
        PageView::VideoGrid(view) => VideoGridTemplate { shell, view }.render()?,
        PageView::Summary(view) => SummaryTemplate { shell, view }.render()?,
        PageView::Chat(view) => ChatTemplate { shell, view }.render()?,
    };
    Ok(html)
}
