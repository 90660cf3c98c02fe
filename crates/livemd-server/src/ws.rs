//! `WebSocket` gateway for viewer connections.
//!
//! Viewers connect to `GET /ws`. After the upgrade the socket is split:
//! the write half is handed to the event loop (which becomes its only
//! writer) and the read half stays on this connection's own task, which
//! forwards every text or binary frame to the loop's inbound queue. When
//! the read side ends for any reason the connection is unregistered and
//! the task returns.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::SinkExt as _;
use futures::StreamExt as _;
use futures::stream::SplitSink;
use tracing::debug;

use crate::actor::GatewayChannels;
use crate::connection::{CloseReason, Connection, ViewerSink};
use crate::error::TransportError;
use crate::router::GatewayState;

/// Write half of an upgraded viewer socket.
pub struct SocketSink(SplitSink<WebSocket, Message>);

impl ViewerSink for SocketSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) {
        let frame = CloseFrame {
            code: reason.code(),
            reason: Utf8Bytes::from_static(reason.as_str()),
        };
        if let Err(e) = self.0.send(Message::Close(Some(frame))).await {
            debug!(error = %e, "viewer close frame failed");
        }
        if let Err(e) = self.0.close().await {
            debug!(error = %e, "viewer close failed");
        }
    }
}

/// Upgrade an HTTP request to a viewer connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_viewer(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    let channels = state.channels.clone();
    ws.on_upgrade(move |socket| read_pump(socket, channels))
}

/// Register the connection, then forward inbound frames until the read
/// side ends.
async fn read_pump(socket: WebSocket, channels: GatewayChannels<SocketSink>) {
    let (sink, mut stream) = socket.split();
    let conn = Connection::new(SocketSink(sink));
    let id = conn.id;

    if !channels.register(conn).await {
        debug!(conn = %id, "sync loop stopped, refusing viewer");
        return;
    }
    debug!(conn = %id, "viewer connected");

    while let Some(result) = stream.next().await {
        let frame = match result {
            Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_str().as_bytes()),
            Ok(Message::Binary(data)) => data,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(conn = %id, error = %e, "viewer read failed");
                break;
            }
        };

        if !channels.forward(frame).await {
            break;
        }
    }

    channels.unregister(id).await;
    debug!(conn = %id, "viewer read pump finished");
}
