//! Axum router construction for the preview gateway.
//!
//! Three routes, one shared [`GatewayState`]:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/` | [`index`] -- static HTML shell |
//! | `GET` | `/ws` | [`ws_viewer`](crate::ws::ws_viewer) -- viewer connection |
//! | `GET`/`HEAD` | `/@mdfs/{id}` | [`serve_asset`](crate::asset::serve_asset) -- local asset |

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::actor::GatewayChannels;
use crate::asset;
use crate::ws::{self, SocketSink};

/// Route pattern for local assets. Must agree with
/// [`ASSET_PREFIX`](livemd_types::ASSET_PREFIX).
pub const ASSET_ROUTE: &str = "/@mdfs/{id}";

/// Shared state injected into gateway handlers.
pub struct GatewayState {
    /// Pre-rendered page shell, built once and served as-is.
    pub shell: Bytes,
    /// Queues into the event loop.
    pub channels: GatewayChannels<SocketSink>,
}

impl GatewayState {
    /// Create gateway state from a shell and the event loop's queues.
    pub fn new(shell: impl Into<Bytes>, channels: GatewayChannels<SocketSink>) -> Self {
        Self {
            shell: shell.into(),
            channels,
        }
    }
}

/// Serve the static HTML shell.
///
/// # Route
///
/// `GET /`
pub async fn index(State(state): State<Arc<GatewayState>>) -> Html<Bytes> {
    Html(state.shell.clone())
}

/// Build the complete router for the preview gateway.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws::ws_viewer))
        .route(ASSET_ROUTE, get(asset::serve_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
