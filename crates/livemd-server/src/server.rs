//! Preview server lifecycle and publisher-facing API.
//!
//! [`PreviewServer::new`] performs no I/O. The first publish binds the
//! listener and spawns the sync loop and the HTTP serve loop, exactly
//! once. [`PreviewServer::stop`] shuts HTTP down gracefully (bounded by
//! [`ServerConfig::shutdown_timeout_ms`]) and then stops the sync loop.
//! Stopping is terminal: later publishes fail with
//! [`ServerError::Stopped`].
//!
//! Dropping a running server drops its shutdown senders, which stops both
//! loops as well.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Bytes;
use livemd_types::CursorPosition;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::actor::{self, NavigationHandler, PublisherHandle, RenderUpdate, SyncActor};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::{GatewayState, build_router};
use crate::ws::SocketSink;

/// Live preview server: one publisher, at most one active viewer.
pub struct PreviewServer {
    config: ServerConfig,
    shell: Bytes,
    navigation: watch::Sender<Option<NavigationHandler>>,
    bound: OnceLock<SocketAddr>,
    lifecycle: Mutex<Lifecycle>,
}

enum Lifecycle {
    Idle,
    Running(Running),
    Stopped,
}

struct Running {
    publisher: PublisherHandle,
    http_shutdown: oneshot::Sender<()>,
    http_task: JoinHandle<std::io::Result<()>>,
    loop_shutdown: oneshot::Sender<()>,
    loop_task: JoinHandle<()>,
}

impl PreviewServer {
    /// Create a server that will serve `shell` at `/`.
    ///
    /// Nothing is bound until the first publish.
    pub fn new(config: ServerConfig, shell: impl Into<String>) -> Self {
        let (navigation, _) = watch::channel(None);
        Self {
            config,
            shell: Bytes::from(shell.into()),
            navigation,
            bound: OnceLock::new(),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// The base URL viewers should open.
    ///
    /// Reports the bound address once started, so a configured port of 0
    /// resolves to the real port.
    pub fn url(&self) -> String {
        match self.bound.get() {
            Some(addr) => format!("http://{addr}"),
            None => format!("http://{}", self.config.addr_string()),
        }
    }

    /// The bound listener address, if the server has started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound.get().copied()
    }

    /// The configuration this server was built with.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register the callback for viewer navigation requests, replacing any
    /// previous one.
    ///
    /// The handler runs on the sync loop and must not block.
    pub fn set_navigation_handler<F>(&self, handler: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.navigation.send_replace(Some(Arc::new(handler)));
    }

    /// Remove the navigation callback.
    pub fn clear_navigation_handler(&self) {
        self.navigation.send_replace(None);
    }

    /// Publish a new render. `display_path`'s basename becomes the
    /// viewer-visible filename.
    pub async fn publish_render(
        &self,
        html: impl Into<String>,
        display_path: impl AsRef<Path>,
    ) -> Result<(), ServerError> {
        let update = RenderUpdate {
            html: html.into(),
            filename: display_name(display_path.as_ref()),
        };
        self.publisher().await?.publish_render(update).await
    }

    /// Publish a new cursor position (1-based).
    pub async fn publish_cursor(&self, line: u32, col: u32) -> Result<(), ServerError> {
        self.publisher()
            .await?
            .publish_cursor(CursorPosition::new(line, col))
            .await
    }

    /// Whether the listener is bound and the loops are running.
    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Running(_))
    }

    /// Shut the server down. Idempotent; the instance cannot be restarted.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let previous = {
            let mut lifecycle = self.lifecycle.lock().await;
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        match previous {
            Lifecycle::Running(running) => running.shutdown(self.config.shutdown_timeout()).await,
            Lifecycle::Idle | Lifecycle::Stopped => Ok(()),
        }
    }

    /// Return a publisher handle, starting the server on first use.
    async fn publisher(&self) -> Result<PublisherHandle, ServerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Running(running) => return Ok(running.publisher.clone()),
            Lifecycle::Stopped => return Err(ServerError::Stopped),
            Lifecycle::Idle => {}
        }

        let running = self.start().await?;
        let publisher = running.publisher.clone();
        *lifecycle = Lifecycle::Running(running);
        Ok(publisher)
    }

    async fn start(&self) -> Result<Running, ServerError> {
        let addr = self.config.addr_string();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;
        // Only one start can ever succeed, so the slot is empty here.
        let _ = self.bound.set(local);

        let (publisher, gateway, inbox) = actor::channels::<SocketSink>(self.config.queues);

        let (loop_shutdown, loop_shutdown_rx) = oneshot::channel();
        let sync = SyncActor::new(inbox, self.navigation.subscribe(), loop_shutdown_rx);
        let loop_task = tokio::spawn(sync.run());

        let router = build_router(Arc::new(GatewayState::new(self.shell.clone(), gateway)));
        let (http_shutdown, http_shutdown_rx) = oneshot::channel::<()>();
        let http_task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = http_shutdown_rx.await;
                })
                .await
        });

        info!(addr = %local, "preview server listening");

        Ok(Running {
            publisher,
            http_shutdown,
            http_task,
            loop_shutdown,
            loop_task,
        })
    }
}

impl Running {
    async fn shutdown(self, timeout: Duration) -> Result<(), ServerError> {
        let Self {
            publisher,
            http_shutdown,
            mut http_task,
            loop_shutdown,
            loop_task,
        } = self;
        drop(publisher);

        let _ = http_shutdown.send(());
        let http_result = match tokio::time::timeout(timeout, &mut http_task).await {
            Ok(Ok(served)) => served.map_err(ServerError::from),
            Ok(Err(join)) => Err(ServerError::Serve(std::io::Error::other(join))),
            Err(_elapsed) => {
                warn!(?timeout, "graceful shutdown timed out, aborting HTTP server");
                http_task.abort();
                Err(ServerError::ShutdownTimeout(timeout))
            }
        };

        let _ = loop_shutdown.send(());
        if let Err(e) = loop_task.await {
            warn!(error = %e, "sync loop task failed");
        }

        info!("preview server stopped");
        http_result
    }
}

/// Basename of `path` for display, or an empty string if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
