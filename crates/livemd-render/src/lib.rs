//! Markdown rendering for the livemd preview.
//!
//! The server only moves HTML around; this crate produces it. A
//! [`Renderer`] turns a markdown buffer into an HTML fragment whose block
//! elements carry `data-md-line` so the viewer can follow the editor
//! cursor, and provides the static page shell that hosts the viewer
//! script.
//!
//! [`MarkdownRenderer`] is the built-in implementation.

pub mod error;
pub mod escape;
pub mod images;
pub mod markdown;
pub mod page;

use std::path::Path;

pub use error::RenderError;
pub use markdown::{LINE_ATTRIBUTE, MarkdownOptions, MarkdownRenderer};

/// Converts markdown source into preview HTML.
pub trait Renderer: Send + Sync {
    /// Render `source` into an HTML fragment.
    ///
    /// `source_path` is the file the source came from, if any. Relative
    /// image references are resolved against its directory.
    fn render_fragment(
        &self,
        source: &[u8],
        source_path: Option<&Path>,
    ) -> Result<String, RenderError>;

    /// The static page shell served before any content exists.
    fn render_shell(&self) -> String;
}
