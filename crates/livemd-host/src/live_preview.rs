//! Coordinator between markdown rendering and preview delivery.

use std::path::Path;

use livemd_render::{MarkdownRenderer, Renderer};
use livemd_server::{PreviewServer, ServerConfig};

use crate::error::HostError;

/// Renders markdown and publishes the result to a [`PreviewServer`].
///
/// The server is built with the renderer's page shell and starts on the
/// first publish.
pub struct LivePreview {
    renderer: Box<dyn Renderer>,
    server: PreviewServer,
}

impl LivePreview {
    /// Wire `renderer` to a new preview server.
    pub fn new(config: ServerConfig, renderer: Box<dyn Renderer>) -> Self {
        let server = PreviewServer::new(config, renderer.render_shell());
        Self { renderer, server }
    }

    /// Preview backed by the built-in [`MarkdownRenderer`].
    pub fn with_markdown(config: ServerConfig) -> Self {
        Self::new(config, Box::new(MarkdownRenderer::new()))
    }

    /// The URL viewers should open.
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// The underlying server.
    pub const fn server(&self) -> &PreviewServer {
        &self.server
    }

    /// Render `source` and publish it.
    ///
    /// `path` resolves relative images and names the document in the
    /// viewer.
    pub async fn publish_source(&self, source: &[u8], path: Option<&Path>) -> Result<(), HostError> {
        let fragment = self.renderer.render_fragment(source, path)?;
        self.server
            .publish_render(fragment, path.unwrap_or_else(|| Path::new("")))
            .await?;
        Ok(())
    }

    /// Forward the editor cursor (1-based) to the viewer.
    pub async fn publish_cursor(&self, line: u32, col: u32) -> Result<(), HostError> {
        self.server.publish_cursor(line, col).await?;
        Ok(())
    }

    /// Register the callback for viewer navigation requests.
    pub fn set_navigation_handler<F>(&self, handler: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.server.set_navigation_handler(handler);
    }

    /// Shut the preview server down.
    pub async fn stop(&self) -> Result<(), HostError> {
        self.server.stop().await?;
        Ok(())
    }
}
