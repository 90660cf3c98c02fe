//! Render error types.

/// Errors produced while rendering markdown.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The source is not valid UTF-8.
    #[error("markdown source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
