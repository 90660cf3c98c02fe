//! Host side of livemd: configuration, the [`LivePreview`] coordinator,
//! the [`EditorBridge`] and a file-backed editor front-end.
//!
//! The `livemd` binary wires these together: it watches one markdown file,
//! republishes it on change, forwards cursor positions typed on stdin and
//! logs navigation requests coming back from the viewer.
//!
//! [`LivePreview`]: live_preview::LivePreview
//! [`EditorBridge`]: bridge::EditorBridge

pub mod bridge;
pub mod config;
pub mod editor;
pub mod error;
pub mod live_preview;

pub use error::{EditorError, HostError};
