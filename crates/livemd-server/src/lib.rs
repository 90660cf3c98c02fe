//! Live preview synchronization server for livemd.
//!
//! This crate keeps one browser viewer in sync with an editor-side
//! publisher. It provides an Axum HTTP server that exposes:
//!
//! - **Page shell** (`GET /`) -- a static HTML page built once at startup
//! - **`WebSocket` endpoint** (`/ws`) -- JSON `render`/`cursor` frames out,
//!   `go_to_line` requests in
//! - **Asset endpoint** (`/@mdfs/{id}`) -- local files named by encoded
//!   absolute paths
//!
//! # Architecture
//!
//! All render/cursor state and the active connection live inside a single
//! [`SyncActor`] task fed by bounded queues. It is the only writer to
//! viewer sockets; each connection's reads happen on that connection's own
//! pump task. There are no locks on the hot path. Registering a second
//! viewer closes the first, and every (re)connecting viewer gets a replay
//! of the latest render and cursor.
//!
//! [`SyncActor`]: actor::SyncActor

pub mod actor;
pub mod asset;
pub mod config;
pub mod connection;
pub mod error;
pub mod router;
pub mod server;
pub mod ws;

// Re-export primary types for convenience.
pub use actor::NavigationHandler;
pub use config::{QueueCapacities, ServerConfig};
pub use connection::{CLOSE_CODE_SUPERSEDED, CloseReason};
pub use error::{ServerError, TransportError};
pub use router::build_router;
pub use server::PreviewServer;
