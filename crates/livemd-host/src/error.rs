//! Error types for the `livemd` host.
//!
//! [`HostError`] is the top-level error that wraps every failure mode of
//! the binary, so `main` can propagate with `?`. [`EditorError`] covers
//! the editor front-end.

use std::path::PathBuf;

/// Errors raised by an [`Editor`](crate::bridge::Editor) implementation.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Reading or inspecting the buffer's backing file failed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The editor cannot honor a cursor move.
    #[error("cannot move cursor to line {line}: {reason}")]
    Cursor {
        /// The requested line.
        line: u32,
        /// Why the move was refused.
        reason: String,
    },
}

/// Top-level error for the `livemd` host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The preview server failed to start or stop.
    #[error("preview server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: livemd_server::ServerError,
    },

    /// Markdown rendering failed.
    #[error("render error: {source}")]
    Render {
        /// The underlying render error.
        #[from]
        source: livemd_render::RenderError,
    },

    /// The editor front-end failed.
    #[error("editor error: {source}")]
    Editor {
        /// The underlying editor error.
        #[from]
        source: EditorError,
    },
}
