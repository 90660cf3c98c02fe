//! Error types for the preview server.
//!
//! [`ServerError`] is what publishers see. [`TransportError`] covers a
//! single viewer connection failing and never leaves the event loop: the
//! loop treats it exactly like a disconnect.

use std::time::Duration;

/// Errors surfaced to callers of [`PreviewServer`](crate::PreviewServer).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the HTTP listener.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// The address that was being bound.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The server was stopped and cannot accept publishes.
    #[error("preview server stopped")]
    Stopped,

    /// Graceful HTTP shutdown did not finish in time.
    #[error("graceful shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),

    /// The HTTP serve loop failed.
    #[error("serve error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A viewer connection failed to accept a write or close cleanly.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The frame could not be serialized.
    #[error("frame serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The socket rejected the write.
    #[error("websocket write failed: {0}")]
    Write(String),
}
