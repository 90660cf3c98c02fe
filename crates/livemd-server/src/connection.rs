//! Viewer connections and the single-slot registry.
//!
//! The event loop only ever writes to connections; reading happens on each
//! connection's own pump task (see [`ws`](crate::ws)). [`ViewerSink`] is the
//! write half the loop needs, which keeps the loop testable without a
//! network.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TransportError;

/// Process-unique identifier of a viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the inner counter value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Close code sent to a viewer that another viewer replaced. Viewers must
/// not reconnect on it.
pub const CLOSE_CODE_SUPERSEDED: u16 = 4000;

/// Why the event loop closed a viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A newer viewer registered and took over.
    Superseded,
    /// The viewer went away or a write to it failed.
    Disconnected,
    /// The server is stopping.
    Shutdown,
}

impl CloseReason {
    /// `WebSocket` close code for this reason.
    pub const fn code(self) -> u16 {
        match self {
            Self::Superseded => CLOSE_CODE_SUPERSEDED,
            Self::Disconnected => 1000,
            Self::Shutdown => 1001,
        }
    }

    /// Close frame reason text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::Disconnected => "disconnected",
            Self::Shutdown => "server stopping",
        }
    }
}

/// The write half of a viewer connection.
pub trait ViewerSink: Send + 'static {
    /// Send one text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the connection with `reason`. Errors are not reported; the
    /// connection is gone either way.
    fn close(&mut self, reason: CloseReason) -> impl Future<Output = ()> + Send;
}

/// A registered viewer connection.
pub struct Connection<S> {
    /// Identifier used to match unregistrations.
    pub id: ConnectionId,
    /// Write half owned by the event loop.
    pub sink: S,
}

impl<S> Connection<S> {
    /// Wrap a sink with a fresh identifier.
    pub fn new(sink: S) -> Self {
        Self {
            id: ConnectionId::next(),
            sink,
        }
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Tracks the one viewer connection that receives broadcasts.
#[derive(Debug)]
pub struct ConnectionRegistry<S> {
    active: Option<Connection<S>>,
}

impl<S> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<S> ConnectionRegistry<S> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Make `conn` the active connection, returning the one it supersedes.
    pub fn adopt(&mut self, conn: Connection<S>) -> Option<Connection<S>> {
        self.active.replace(conn)
    }

    /// Remove the active connection if its id is `id`.
    ///
    /// Returns `None` when `id` was already superseded.
    pub fn release(&mut self, id: ConnectionId) -> Option<Connection<S>> {
        if self.active_id() == Some(id) {
            self.active.take()
        } else {
            None
        }
    }

    /// Remove the active connection unconditionally.
    pub const fn take(&mut self) -> Option<Connection<S>> {
        self.active.take()
    }

    /// Mutable access to the active connection.
    pub const fn active_mut(&mut self) -> Option<&mut Connection<S>> {
        self.active.as_mut()
    }

    /// Identifier of the active connection.
    pub fn active_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|c| c.id)
    }

    /// Whether a connection is active.
    pub const fn is_connected(&self) -> bool {
        self.active.is_some()
    }
}
