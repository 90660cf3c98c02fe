//! The synchronization actor.
//!
//! [`SyncActor`] is the single serialization point of the server. It owns
//! the [`RenderState`], the [`CursorState`] and the active viewer
//! connection, and it is the only code that mutates them or writes to a
//! socket. Everything else talks to it through bounded queues:
//!
//! ```text
//! PreviewServer --[render, cursor]--------> SyncActor --[frames]--> active viewer
//! ws pump ------[register, unregister]---->     |
//! ws pump ------[inbound frames]---------->     +--[go_to_line]--> NavigationHandler
//! ```
//!
//! Queues are drained first-ready-wins; no source has priority. A failed
//! write is treated exactly like a disconnect: the connection is closed and
//! forgotten, and the viewer recovers by reconnecting and receiving a fresh
//! replay.

use std::sync::Arc;

use axum::body::Bytes;
use livemd_types::{
    CursorPosition, CursorState, GoToLine, InboundMessage, RenderState, ServerMessage,
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

use crate::config::QueueCapacities;
use crate::connection::{CloseReason, Connection, ConnectionId, ConnectionRegistry, ViewerSink};
use crate::error::{ServerError, TransportError};

/// Callback invoked with the target line of a viewer navigation request.
///
/// Runs inside the event loop, so it must return quickly and never block.
pub type NavigationHandler = Arc<dyn Fn(u32) + Send + Sync>;

/// A render publish waiting for the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderUpdate {
    /// Rendered HTML fragment.
    pub html: String,
    /// Display name of the source.
    pub filename: String,
}

// ---------------------------------------------------------------------------
// Queue endpoints
// ---------------------------------------------------------------------------

/// Sending side used by the publisher.
#[derive(Debug, Clone)]
pub struct PublisherHandle {
    renders: mpsc::Sender<RenderUpdate>,
    cursors: mpsc::Sender<CursorPosition>,
}

impl PublisherHandle {
    /// Queue a render. Waits while the render queue is full.
    pub async fn publish_render(&self, update: RenderUpdate) -> Result<(), ServerError> {
        if self.renders.send(update).await.is_err() {
            return Err(ServerError::Stopped);
        }
        Ok(())
    }

    /// Queue a cursor position. Waits while the cursor queue is full.
    pub async fn publish_cursor(&self, position: CursorPosition) -> Result<(), ServerError> {
        if self.cursors.send(position).await.is_err() {
            return Err(ServerError::Stopped);
        }
        Ok(())
    }
}

/// Sending side used by the gateway's connection pumps.
pub struct GatewayChannels<S> {
    register: mpsc::Sender<Connection<S>>,
    unregister: mpsc::Sender<ConnectionId>,
    inbound: mpsc::Sender<Bytes>,
}

impl<S> Clone for GatewayChannels<S> {
    fn clone(&self) -> Self {
        Self {
            register: self.register.clone(),
            unregister: self.unregister.clone(),
            inbound: self.inbound.clone(),
        }
    }
}

impl<S> GatewayChannels<S> {
    /// Hand a new connection to the event loop.
    ///
    /// Returns `false` once the event loop has stopped.
    pub async fn register(&self, conn: Connection<S>) -> bool {
        self.register.send(conn).await.is_ok()
    }

    /// Tell the event loop a connection's read side ended.
    pub async fn unregister(&self, id: ConnectionId) {
        // The loop may already be gone during shutdown; nothing to do then.
        let _ = self.unregister.send(id).await;
    }

    /// Forward one raw inbound frame. Returns `false` once the event loop
    /// has stopped.
    pub async fn forward(&self, frame: Bytes) -> bool {
        self.inbound.send(frame).await.is_ok()
    }
}

/// Receiving side owned by the event loop.
pub struct ActorInbox<S> {
    renders: mpsc::Receiver<RenderUpdate>,
    cursors: mpsc::Receiver<CursorPosition>,
    register: mpsc::Receiver<Connection<S>>,
    unregister: mpsc::Receiver<ConnectionId>,
    inbound: mpsc::Receiver<Bytes>,
}

/// Create the five bounded queues feeding a [`SyncActor`].
pub fn channels<S>(
    capacities: QueueCapacities,
) -> (PublisherHandle, GatewayChannels<S>, ActorInbox<S>) {
    let caps = capacities.clamped();
    let (renders_tx, renders_rx) = mpsc::channel(caps.render);
    let (cursors_tx, cursors_rx) = mpsc::channel(caps.cursor);
    let (register_tx, register_rx) = mpsc::channel(caps.register);
    let (unregister_tx, unregister_rx) = mpsc::channel(caps.unregister);
    let (inbound_tx, inbound_rx) = mpsc::channel(caps.inbound);

    (
        PublisherHandle {
            renders: renders_tx,
            cursors: cursors_tx,
        },
        GatewayChannels {
            register: register_tx,
            unregister: unregister_tx,
            inbound: inbound_tx,
        },
        ActorInbox {
            renders: renders_rx,
            cursors: cursors_rx,
            register: register_rx,
            unregister: unregister_rx,
            inbound: inbound_rx,
        },
    )
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The event loop owning render state, cursor state and the active viewer.
pub struct SyncActor<S> {
    render: RenderState,
    cursor: CursorState,
    registry: ConnectionRegistry<S>,
    navigation: watch::Receiver<Option<NavigationHandler>>,
    inbox: ActorInbox<S>,
    shutdown: oneshot::Receiver<()>,
}

impl<S: ViewerSink> SyncActor<S> {
    /// Create an actor with empty state.
    ///
    /// The actor stops when `shutdown` fires or its sender is dropped.
    pub fn new(
        inbox: ActorInbox<S>,
        navigation: watch::Receiver<Option<NavigationHandler>>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            render: RenderState::new(),
            cursor: CursorState::new(),
            registry: ConnectionRegistry::new(),
            navigation,
            inbox,
            shutdown,
        }
    }

    /// Run until shutdown. Consumes the actor; it cannot be restarted.
    pub async fn run(mut self) {
        debug!("sync loop started");
        loop {
            tokio::select! {
                Some(update) = self.inbox.renders.recv() => self.on_render(update).await,
                Some(position) = self.inbox.cursors.recv() => self.on_cursor(position).await,
                Some(conn) = self.inbox.register.recv() => self.on_register(conn).await,
                Some(id) = self.inbox.unregister.recv() => self.on_unregister(id).await,
                Some(frame) = self.inbox.inbound.recv() => self.on_inbound(&frame),
                _ = &mut self.shutdown => {
                    if let Some(mut conn) = self.registry.take() {
                        conn.sink.close(CloseReason::Shutdown).await;
                    }
                    debug!(rev = self.render.revision, "sync loop stopped");
                    return;
                }
            }
        }
    }

    async fn on_render(&mut self, update: RenderUpdate) {
        let rev = self.render.apply(update.html, update.filename);
        trace!(rev, "render published");

        if !self.registry.is_connected() {
            return;
        }

        let frame = self.render.to_message();
        if !self.deliver(&frame).await {
            return;
        }

        if let Some(cursor) = self.cursor.stamp(rev) {
            self.deliver(&cursor).await;
        }
    }

    async fn on_cursor(&mut self, position: CursorPosition) {
        self.cursor.update(position);

        if !self.registry.is_connected() || !self.render.has_render() {
            return;
        }

        if let Some(frame) = self.cursor.stamp(self.render.revision) {
            self.deliver(&frame).await;
        }
    }

    async fn on_register(&mut self, conn: Connection<S>) {
        let id = conn.id;
        if let Some(mut superseded) = self.registry.adopt(conn) {
            debug!(conn = %id, superseded = %superseded.id, "viewer superseded");
            superseded.sink.close(CloseReason::Superseded).await;
        } else {
            debug!(conn = %id, "viewer registered");
        }

        let frame = self.render.to_message();
        if !self.deliver(&frame).await {
            return;
        }

        if self.render.has_render()
            && let Some(cursor) = self.cursor.stamp(self.render.revision)
        {
            self.deliver(&cursor).await;
        }
    }

    async fn on_unregister(&mut self, id: ConnectionId) {
        if let Some(mut conn) = self.registry.release(id) {
            debug!(conn = %id, "viewer disconnected");
            conn.sink.close(CloseReason::Disconnected).await;
        } else {
            trace!(conn = %id, "ignoring unregister of superseded viewer");
        }
    }

    fn on_inbound(&self, frame: &[u8]) {
        match InboundMessage::parse(frame) {
            Ok(InboundMessage::GoToLine(GoToLine { line })) => {
                // Clone out of the watch slot so a handler that re-registers
                // does not contend with this borrow.
                let handler = self.navigation.borrow().clone();
                match handler {
                    Some(handler) => handler(line),
                    None => debug!(line, "no navigation handler registered"),
                }
            }
            Err(e) => debug!(error = %e, "ignoring inbound frame"),
        }
    }

    /// Write one frame to the active connection.
    ///
    /// Returns `false` if there is no active connection or the write
    /// failed, in which case the connection has been dropped.
    async fn deliver(&mut self, frame: &ServerMessage) -> bool {
        let Some(conn) = self.registry.active_mut() else {
            return false;
        };
        let id = conn.id;

        let result = match frame.to_json() {
            Ok(text) => conn.sink.send_text(text).await,
            Err(e) => Err(TransportError::from(e)),
        };

        match result {
            Ok(()) => {
                trace!(conn = %id, rev = frame.rev(), "frame delivered");
                true
            }
            Err(e) => {
                debug!(conn = %id, error = %e, "viewer write failed, dropping connection");
                if let Some(mut dropped) = self.registry.take() {
                    dropped.sink.close(CloseReason::Disconnected).await;
                }
                false
            }
        }
    }
}
