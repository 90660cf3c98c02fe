//! Render and cursor state owned by the synchronization loop.
//!
//! Both values are created empty when the server is built and mutated in
//! place for its lifetime. Neither is shared by reference outside the loop;
//! the loop hands out [`ServerMessage`] snapshots instead.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::messages::ServerMessage;

/// The latest published render.
///
/// `revision` starts at 0 ("nothing published yet") and increases by
/// exactly one per accepted publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Latest rendered HTML fragment.
    pub html: String,
    /// Display name of the current source.
    pub filename: String,
    /// Revision of this snapshot.
    pub revision: u64,
}

impl RenderState {
    /// Create an empty state at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new render and bump the revision. Returns the new revision.
    pub fn apply(&mut self, html: String, filename: String) -> u64 {
        self.revision = self.revision.saturating_add(1);
        self.html = html;
        self.filename = filename;
        self.revision
    }

    /// Whether at least one render has been published.
    pub const fn has_render(&self) -> bool {
        self.revision > 0
    }

    /// Build the `render` frame for this snapshot.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::Render {
            html: self.html.clone(),
            filename: self.filename.clone(),
            rev: self.revision,
        }
    }
}

/// An editor cursor position in 1-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CursorPosition {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl CursorPosition {
    /// Create a cursor position.
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// The latest published cursor, if any.
///
/// `position` being `None` distinguishes "no cursor yet" from a real
/// position. `revision` records the render revision the cursor was last
/// stamped with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    /// Last published position.
    pub position: Option<CursorPosition>,
    /// Render revision of the last stamp.
    pub revision: u64,
}

impl CursorState {
    /// Create an empty state with no cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a newly published position.
    pub const fn update(&mut self, position: CursorPosition) {
        self.position = Some(position);
    }

    /// Whether a cursor has ever been published.
    pub const fn has_value(&self) -> bool {
        self.position.is_some()
    }

    /// Stamp the cursor with `revision` and build its frame.
    ///
    /// Returns `None` when no cursor has been published.
    pub const fn stamp(&mut self, revision: u64) -> Option<ServerMessage> {
        match self.position {
            Some(CursorPosition { line, col }) => {
                self.revision = revision;
                Some(ServerMessage::Cursor {
                    line,
                    col,
                    rev: revision,
                })
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_revision_starts_at_zero() {
        let state = RenderState::new();
        assert_eq!(state.revision, 0);
        assert!(!state.has_render());
        assert_eq!(
            state.to_message(),
            ServerMessage::Render {
                html: String::new(),
                filename: String::new(),
                rev: 0,
            }
        );
    }

    #[test]
    fn render_revision_increments_by_one() {
        let mut state = RenderState::new();
        for expected in 1..=5 {
            let rev = state.apply(format!("<p>{expected}</p>"), String::from("a.md"));
            assert_eq!(rev, expected);
        }
        assert_eq!(state.html, "<p>5</p>");
        assert!(state.has_render());
    }

    #[test]
    fn cursor_without_value_does_not_stamp() {
        let mut cursor = CursorState::new();
        assert!(!cursor.has_value());
        assert!(cursor.stamp(4).is_none());
        assert_eq!(cursor.revision, 0);
    }

    #[test]
    fn cursor_stamp_uses_given_revision() {
        let mut cursor = CursorState::new();
        cursor.update(CursorPosition::new(10, 2));
        assert_eq!(
            cursor.stamp(3),
            Some(ServerMessage::Cursor { line: 10, col: 2, rev: 3 })
        );
        assert_eq!(
            cursor.stamp(4),
            Some(ServerMessage::Cursor { line: 10, col: 2, rev: 4 })
        );
        assert_eq!(cursor.revision, 4);
    }
}
