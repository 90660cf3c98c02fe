//! Editor bridge: connects an editor front-end to the live preview.
//!
//! The bridge is a small state machine driven by editor events:
//!
//! - [`start`](EditorBridge::start) activates the preview and publishes the
//!   buffer followed by the cursor.
//! - [`buffer_changed`](EditorBridge::buffer_changed) and
//!   [`cursor_moved`](EditorBridge::cursor_moved) republish while active.
//! - Viewer navigation requests arrive on a bounded queue that the server's
//!   navigation handler feeds without blocking; the owner drains it with
//!   [`next_navigation`](EditorBridge::next_navigation) and applies each
//!   request with [`handle_navigation`](EditorBridge::handle_navigation).
//!
//! The bridge remembers the last cursor it published or set, so repeated
//! cursor events and echoes of its own navigation are dropped.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use livemd_types::CursorPosition;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{EditorError, HostError};
use crate::live_preview::LivePreview;

/// Default capacity of the navigation request queue.
pub const NAVIGATION_QUEUE_CAPACITY: usize = 16;

/// The editor side of the bridge.
pub trait Editor: Send {
    /// Current buffer contents.
    fn buffer_text(&mut self) -> impl Future<Output = Result<Vec<u8>, EditorError>> + Send;

    /// Absolute path of the buffer's file, if it has one.
    fn buffer_path(&self) -> Option<PathBuf>;

    /// Current cursor position (1-based line and column).
    fn cursor(&self) -> CursorPosition;

    /// Move the editor cursor.
    fn set_cursor(&mut self, line: u32, col: u32) -> Result<(), EditorError>;
}

/// Build a navigation handler that forwards lines into `queue`.
///
/// The handler never blocks: when the queue is full or closed the request
/// is dropped.
pub fn queue_handler(queue: mpsc::Sender<u32>) -> impl Fn(u32) + Send + Sync + 'static {
    move |line| {
        if let Err(e) = queue.try_send(line) {
            debug!(line, error = %e, "dropping navigation request");
        }
    }
}

/// Drives a [`LivePreview`] from editor events.
pub struct EditorBridge<E> {
    editor: E,
    preview: Arc<LivePreview>,
    active: bool,
    last_cursor: CursorPosition,
    navigation: mpsc::Receiver<u32>,
}

impl<E: Editor> EditorBridge<E> {
    /// Create an inactive bridge and register its navigation handler on
    /// `preview`, replacing any previous handler.
    pub fn new(editor: E, preview: Arc<LivePreview>, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        preview.set_navigation_handler(queue_handler(tx));
        Self {
            editor,
            preview,
            active: false,
            last_cursor: CursorPosition::new(0, 0),
            navigation: rx,
        }
    }

    /// Whether the preview is active.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The wrapped editor.
    pub const fn editor(&self) -> &E {
        &self.editor
    }

    /// The wrapped editor, mutably.
    pub const fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    /// The last cursor published or set by the bridge.
    pub const fn last_cursor(&self) -> CursorPosition {
        self.last_cursor
    }

    /// Activate the preview and publish the buffer, then the cursor.
    ///
    /// If the buffer cannot be published the bridge stays inactive. A
    /// cursor failure leaves it active. Returns the preview URL.
    pub async fn start(&mut self) -> Result<String, HostError> {
        self.active = true;
        self.last_cursor = CursorPosition::new(0, 0);

        if let Err(e) = self.publish_buffer().await {
            self.active = false;
            return Err(e);
        }

        let cursor = self.editor.cursor();
        self.publish_cursor(cursor.line, cursor.col).await?;
        Ok(self.preview.url())
    }

    /// Republish the buffer. Does nothing while inactive.
    pub async fn buffer_changed(&mut self) -> Result<(), HostError> {
        if !self.active {
            return Ok(());
        }
        self.publish_buffer().await
    }

    /// Publish a cursor move. Does nothing while inactive or when the
    /// position equals the last one.
    pub async fn cursor_moved(&mut self, line: u32, col: u32) -> Result<(), HostError> {
        if !self.active {
            return Ok(());
        }
        self.publish_cursor(line, col).await
    }

    /// Wait for the next viewer navigation request.
    pub async fn next_navigation(&mut self) -> Option<u32> {
        self.navigation.recv().await
    }

    /// Move the editor cursor to `line` on behalf of the viewer.
    ///
    /// Ignored while inactive or when the editor is already on that line.
    /// Returns whether the editor was moved.
    pub fn navigate(&mut self, line: u32) -> Result<bool, EditorError> {
        if !self.active || line == self.last_cursor.line {
            trace!(line, active = self.active, "navigation ignored");
            return Ok(false);
        }

        self.editor.set_cursor(line, 1)?;
        self.last_cursor = CursorPosition::new(line, 0);
        debug!(line, "editor moved by viewer");
        Ok(true)
    }

    /// Apply a viewer navigation request and publish the editor's new
    /// cursor.
    ///
    /// A line the editor rejects is logged and dropped: viewer input never
    /// ends the session. Publish failures are returned.
    pub async fn handle_navigation(&mut self, line: u32) -> Result<(), HostError> {
        match self.navigate(line) {
            Ok(true) => {
                let cursor = self.editor.cursor();
                self.publish_cursor(cursor.line, cursor.col).await
            }
            Ok(false) => Ok(()),
            Err(e) => {
                warn!(line, error = %e, "rejected navigation request");
                Ok(())
            }
        }
    }

    async fn publish_buffer(&mut self) -> Result<(), HostError> {
        let source = self.editor.buffer_text().await?;
        let path = self.editor.buffer_path();
        self.preview.publish_source(&source, path.as_deref()).await
    }

    async fn publish_cursor(&mut self, line: u32, col: u32) -> Result<(), HostError> {
        let position = CursorPosition::new(line, col);
        if position == self.last_cursor {
            return Ok(());
        }
        self.last_cursor = position;
        self.preview.publish_cursor(line, col).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use livemd_server::ServerConfig;

    use super::*;
    use crate::editor::FileEditor;

    /// In-memory editor.
    struct MemoryEditor {
        text: Vec<u8>,
        path: Option<PathBuf>,
        cursor: CursorPosition,
        moves: Vec<(u32, u32)>,
    }

    impl MemoryEditor {
        fn new(text: &[u8]) -> Self {
            Self {
                text: text.to_vec(),
                path: Some(PathBuf::from("/notes/today.md")),
                cursor: CursorPosition::new(1, 1),
                moves: Vec::new(),
            }
        }
    }

    impl Editor for MemoryEditor {
        async fn buffer_text(&mut self) -> Result<Vec<u8>, EditorError> {
            Ok(self.text.clone())
        }

        fn buffer_path(&self) -> Option<PathBuf> {
            self.path.clone()
        }

        fn cursor(&self) -> CursorPosition {
            self.cursor
        }

        fn set_cursor(&mut self, line: u32, col: u32) -> Result<(), EditorError> {
            self.cursor = CursorPosition::new(line, col);
            self.moves.push((line, col));
            Ok(())
        }
    }

    fn preview() -> Arc<LivePreview> {
        Arc::new(LivePreview::with_markdown(ServerConfig::ephemeral()))
    }

    #[tokio::test]
    async fn inactive_bridge_publishes_nothing() {
        let preview = preview();
        let mut bridge = EditorBridge::new(MemoryEditor::new(b"# a\n"), Arc::clone(&preview), 4);

        bridge.buffer_changed().await.unwrap();
        bridge.cursor_moved(3, 1).await.unwrap();
        assert!(!bridge.is_active());
        assert!(!preview.server().is_running().await);
        assert!(!bridge.navigate(5).unwrap());
    }

    #[tokio::test]
    async fn start_publishes_and_activates() {
        let preview = preview();
        let mut editor = MemoryEditor::new(b"# a\n\nbody\n");
        editor.cursor = CursorPosition::new(3, 2);
        let mut bridge = EditorBridge::new(editor, Arc::clone(&preview), 4);

        let url = bridge.start().await.unwrap();
        assert!(bridge.is_active());
        assert_eq!(url, preview.url());
        assert!(preview.server().is_running().await);
        assert_eq!(bridge.last_cursor(), CursorPosition::new(3, 2));

        preview.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_failure_leaves_bridge_inactive() {
        let preview = preview();
        let mut bridge = EditorBridge::new(MemoryEditor::new(&[0xff]), Arc::clone(&preview), 4);

        assert!(matches!(
            bridge.start().await,
            Err(HostError::Render { .. })
        ));
        assert!(!bridge.is_active());

        // Later events are ignored until the next successful start.
        bridge.buffer_changed().await.unwrap();
        assert!(!preview.server().is_running().await);
    }

    #[tokio::test]
    async fn repeated_cursor_is_suppressed() {
        let preview = preview();
        let mut bridge = EditorBridge::new(MemoryEditor::new(b"x\n"), Arc::clone(&preview), 4);
        bridge.start().await.unwrap();

        bridge.cursor_moved(4, 2).await.unwrap();
        assert_eq!(bridge.last_cursor(), CursorPosition::new(4, 2));
        bridge.cursor_moved(4, 2).await.unwrap();
        assert_eq!(bridge.last_cursor(), CursorPosition::new(4, 2));

        preview.stop().await.unwrap();
        // Suppressed moves never reach the stopped server.
        bridge.cursor_moved(4, 2).await.unwrap();
        assert!(bridge.cursor_moved(5, 1).await.is_err());
    }

    #[tokio::test]
    async fn navigate_moves_editor_once() {
        let preview = preview();
        let mut bridge = EditorBridge::new(MemoryEditor::new(b"x\n"), Arc::clone(&preview), 4);
        bridge.start().await.unwrap();

        assert!(bridge.navigate(12).unwrap());
        assert_eq!(bridge.editor().moves, vec![(12, 1)]);
        assert_eq!(bridge.last_cursor(), CursorPosition::new(12, 0));

        // Same line again is an echo.
        assert!(!bridge.navigate(12).unwrap());
        assert_eq!(bridge.editor().moves.len(), 1);

        // The editor reports (12, 1), which differs from (12, 0) and is
        // published.
        bridge.cursor_moved(12, 1).await.unwrap();
        assert_eq!(bridge.last_cursor(), CursorPosition::new(12, 1));

        preview.stop().await.unwrap();
    }

    #[tokio::test]
    async fn handled_navigation_publishes_editor_cursor() {
        let preview = preview();
        let mut bridge = EditorBridge::new(MemoryEditor::new(b"x\n"), Arc::clone(&preview), 4);
        bridge.start().await.unwrap();

        bridge.handle_navigation(7).await.unwrap();
        assert_eq!(bridge.editor().moves, vec![(7, 1)]);
        assert_eq!(bridge.last_cursor(), CursorPosition::new(7, 1));

        preview.stop().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_navigation_keeps_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# a\n\nb\n").unwrap();
        let editor = FileEditor::open(&file).await.unwrap();

        let preview = preview();
        let mut bridge = EditorBridge::new(editor, Arc::clone(&preview), 4);
        bridge.start().await.unwrap();

        // FileEditor refuses line 0; the request is dropped, not fatal.
        bridge.handle_navigation(0).await.unwrap();
        assert!(bridge.is_active());
        assert_eq!(bridge.editor().cursor(), CursorPosition::new(1, 1));

        // Later requests still go through.
        bridge.handle_navigation(3).await.unwrap();
        assert_eq!(bridge.editor().cursor(), CursorPosition::new(3, 1));
        assert!(preview.server().is_running().await);

        preview.stop().await.unwrap();
    }

    #[tokio::test]
    async fn queue_handler_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let handler = queue_handler(tx);
        handler(3);
        handler(4);

        assert_eq!(rx.recv().await, Some(3));
        assert!(rx.try_recv().is_err());
    }
}
