//! Server configuration.
//!
//! [`ServerConfig`] is deserialized from the `server` section of
//! `livemd.yaml` by the host binary. Every field has a default so an empty
//! section (or no file at all) yields a working local server.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the preview server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on. `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on graceful HTTP shutdown, in milliseconds.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Capacities of the event loop's input queues.
    #[serde(default)]
    pub queues: QueueCapacities,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            queues: QueueCapacities::default(),
        }
    }
}

impl ServerConfig {
    /// Config bound to `127.0.0.1` on an OS-assigned port.
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            ..Self::default()
        }
    }

    /// The `host:port` string this config describes.
    ///
    /// Host names are resolved when the listener binds.
    pub fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Graceful shutdown bound as a [`Duration`].
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Capacities of the bounded FIFO queues feeding the event loop.
///
/// Publishers wait when a queue is full. Values of 0 are raised to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueueCapacities {
    /// Render publishes.
    #[serde(default = "default_render_capacity")]
    pub render: usize,

    /// Cursor publishes.
    #[serde(default = "default_cursor_capacity")]
    pub cursor: usize,

    /// Connection registrations.
    #[serde(default = "default_register_capacity")]
    pub register: usize,

    /// Connection unregistrations.
    #[serde(default = "default_register_capacity")]
    pub unregister: usize,

    /// Inbound viewer frames.
    #[serde(default = "default_inbound_capacity")]
    pub inbound: usize,
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            render: default_render_capacity(),
            cursor: default_cursor_capacity(),
            register: default_register_capacity(),
            unregister: default_register_capacity(),
            inbound: default_inbound_capacity(),
        }
    }
}

impl QueueCapacities {
    /// Copy with every capacity raised to at least 1.
    pub const fn clamped(self) -> Self {
        Self {
            render: at_least_one(self.render),
            cursor: at_least_one(self.cursor),
            register: at_least_one(self.register),
            unregister: at_least_one(self.unregister),
            inbound: at_least_one(self.inbound),
        }
    }
}

const fn at_least_one(n: usize) -> usize {
    if n == 0 { 1 } else { n }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    7777
}

const fn default_shutdown_timeout_ms() -> u64 {
    2000
}

const fn default_render_capacity() -> usize {
    8
}

const fn default_cursor_capacity() -> usize {
    32
}

const fn default_register_capacity() -> usize {
    4
}

const fn default_inbound_capacity() -> usize {
    64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_preview() {
        let config = ServerConfig::default();
        assert_eq!(config.addr_string(), "127.0.0.1:7777");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
        assert_eq!(config.queues.render, 8);
        assert_eq!(config.queues.cursor, 32);
        assert_eq!(config.queues.inbound, 64);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 9000, "queues": {"cursor": 2}}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.queues.cursor, 2);
        assert_eq!(config.queues.render, 8);
    }

    #[test]
    fn zero_capacities_are_clamped() {
        let queues = QueueCapacities {
            render: 0,
            cursor: 0,
            register: 0,
            unregister: 3,
            inbound: 0,
        }
        .clamped();
        assert_eq!(queues.render, 1);
        assert_eq!(queues.cursor, 1);
        assert_eq!(queues.register, 1);
        assert_eq!(queues.unregister, 3);
        assert_eq!(queues.inbound, 1);
    }

    #[test]
    fn ephemeral_uses_port_zero() {
        assert_eq!(ServerConfig::ephemeral().addr_string(), "127.0.0.1:0");
    }
}
