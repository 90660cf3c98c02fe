//! The embedded preview page.
//!
//! `page.html` is the whole viewer: styles, an empty content element and
//! the script that keeps it in sync over `/ws`. Content is normally
//! delivered over the socket, so the shell is served with the placeholder
//! removed.

/// Marker replaced with the rendered fragment.
pub const CONTENT_PLACEHOLDER: &str = "{{CONTENT}}";

const PAGE_TEMPLATE: &str = include_str!("page.html");

/// The page with no content, served at `/`.
pub fn shell() -> String {
    fill("")
}

/// The page with `fragment` in place of the content placeholder.
pub fn fill(fragment: &str) -> String {
    PAGE_TEMPLATE.replacen(CONTENT_PLACEHOLDER, fragment, 1)
}
