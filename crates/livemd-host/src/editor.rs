//! File-backed editor front-end for the `livemd` binary.
//!
//! The "buffer" is a markdown file on disk. Edits are detected by polling
//! its modification time, and the cursor is whatever was last typed on
//! stdin as `<line>[:<col>]`. Viewer navigation requests only move this
//! stored cursor and are reported in the log.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use livemd_types::CursorPosition;
use tracing::info;

use crate::bridge::Editor;
use crate::error::EditorError;

/// An [`Editor`] over a file on disk.
#[derive(Debug)]
pub struct FileEditor {
    path: PathBuf,
    cursor: CursorPosition,
    modified: SystemTime,
}

impl FileEditor {
    /// Open `path`, which must name an existing file.
    ///
    /// The path is made absolute so relative images resolve no matter
    /// where the viewer's requests are served from.
    pub async fn open(path: &Path) -> Result<Self, EditorError> {
        let path = std::path::absolute(path).map_err(|source| EditorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = modified_time(&path).await?;
        Ok(Self {
            path,
            cursor: CursorPosition::new(1, 1),
            modified,
        })
    }

    /// The file being previewed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the file changed since the last check.
    pub async fn poll_changed(&mut self) -> Result<bool, EditorError> {
        let modified = modified_time(&self.path).await?;
        if self.modified == modified {
            return Ok(false);
        }
        self.modified = modified;
        Ok(true)
    }
}

impl Editor for FileEditor {
    async fn buffer_text(&mut self) -> Result<Vec<u8>, EditorError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| EditorError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn buffer_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    fn set_cursor(&mut self, line: u32, col: u32) -> Result<(), EditorError> {
        if line == 0 {
            return Err(EditorError::Cursor {
                line,
                reason: "lines start at 1".to_owned(),
            });
        }
        self.cursor = CursorPosition::new(line, col.max(1));
        info!(line, path = %self.path.display(), "viewer requested line");
        Ok(())
    }
}

async fn modified_time(path: &Path) -> Result<SystemTime, EditorError> {
    let io_err = |source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::metadata(path)
        .await
        .map_err(io_err)?
        .modified()
        .map_err(io_err)
}

/// Parse a stdin cursor command: `<line>` or `<line>:<col>`, both 1-based.
///
/// The column defaults to 1. Returns `None` for anything else.
pub fn parse_cursor_command(input: &str) -> Option<CursorPosition> {
    let input = input.trim();
    let (line, col) = match input.split_once(':') {
        Some((line, col)) => (line.trim(), col.trim().parse().ok()?),
        None => (input, 1),
    };
    let line: u32 = line.parse().ok()?;
    if line == 0 || col == 0 {
        return None;
    }
    Some(CursorPosition::new(line, col))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn cursor_commands() {
        assert_eq!(parse_cursor_command("12"), Some(CursorPosition::new(12, 1)));
        assert_eq!(
            parse_cursor_command(" 7:4 \n"),
            Some(CursorPosition::new(7, 4))
        );
        assert_eq!(parse_cursor_command("0"), None);
        assert_eq!(parse_cursor_command("3:0"), None);
        assert_eq!(parse_cursor_command("-1"), None);
        assert_eq!(parse_cursor_command("abc"), None);
        assert_eq!(parse_cursor_command("4:x"), None);
        assert_eq!(parse_cursor_command(""), None);
    }

    #[tokio::test]
    async fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileEditor::open(&dir.path().join("none.md")).await.unwrap_err();
        assert!(matches!(err, EditorError::Io { .. }));
    }

    #[tokio::test]
    async fn reads_buffer_and_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# one\n").unwrap();

        let mut editor = FileEditor::open(&file).await.unwrap();
        assert!(editor.path().is_absolute());
        assert_eq!(editor.buffer_path(), Some(editor.path().to_path_buf()));
        assert_eq!(editor.buffer_text().await.unwrap(), b"# one\n");
        assert!(!editor.poll_changed().await.unwrap());

        // Push the mtime forward explicitly; coarse filesystem clocks can
        // otherwise hide a quick rewrite.
        std::fs::write(&file, "# two\n").unwrap();
        let later = SystemTime::now().checked_add(Duration::from_secs(5)).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert!(editor.poll_changed().await.unwrap());
        assert!(!editor.poll_changed().await.unwrap());
        assert_eq!(editor.buffer_text().await.unwrap(), b"# two\n");
    }

    #[tokio::test]
    async fn set_cursor_rejects_line_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "x").unwrap();
        let mut editor = FileEditor::open(&file).await.unwrap();

        assert!(editor.set_cursor(0, 1).is_err());
        editor.set_cursor(9, 1).unwrap();
        assert_eq!(editor.cursor(), CursorPosition::new(9, 1));
    }
}
