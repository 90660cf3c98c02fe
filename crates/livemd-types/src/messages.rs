//! JSON frames exchanged with browser viewers.
//!
//! Outbound frames use an internally-tagged enum so the discriminator lands
//! in a `type` field (`{"type": "render", ...}`). Inbound frames are parsed
//! in two steps: a minimal envelope carrying only the discriminator, then
//! the full payload for the recognized type. Anything else is reported as
//! an [`InboundError`] and the caller is expected to drop it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Discriminator for rendered HTML frames.
pub const MESSAGE_TYPE_RENDER: &str = "render";
/// Discriminator for cursor frames.
pub const MESSAGE_TYPE_CURSOR: &str = "cursor";
/// Discriminator for viewer navigation requests.
pub const MESSAGE_TYPE_GO_TO_LINE: &str = "go_to_line";

// ---------------------------------------------------------------------------
// Server -> Viewer
// ---------------------------------------------------------------------------

/// Frames sent from the server to the active viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A full rendered fragment replacing the viewer's content.
    Render {
        /// Rendered HTML fragment.
        html: String,
        /// Display name of the source (basename only).
        filename: String,
        /// Render revision this fragment belongs to.
        rev: u64,
    },

    /// Editor cursor position, stamped with the render it applies to.
    Cursor {
        /// 1-based line.
        line: u32,
        /// 1-based column.
        col: u32,
        /// Render revision in effect when the frame was sent.
        rev: u64,
    },
}

impl ServerMessage {
    /// The revision carried by this frame.
    pub const fn rev(&self) -> u64 {
        match self {
            Self::Render { rev, .. } | Self::Cursor { rev, .. } => *rev,
        }
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Viewer -> Server
// ---------------------------------------------------------------------------

/// Payload of a `go_to_line` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct GoToLine {
    /// 1-based source line the viewer asked to jump to.
    pub line: u32,
}

/// A recognized frame sent by a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundMessage {
    /// The viewer asked the editor to move to a source line.
    GoToLine(GoToLine),
}

/// Why an inbound frame was not recognized.
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    /// The frame is not valid JSON or does not match the payload shape.
    #[error("malformed inbound frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame carries a `type` this server does not handle.
    #[error("unknown inbound frame type: {0}")]
    UnknownType(String),

    /// A `go_to_line` request for line 0. Lines are 1-based.
    #[error("go_to_line requires a 1-based line, got 0")]
    ZeroLine,
}

/// Minimal envelope used to route inbound frames.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl InboundMessage {
    /// Parse raw frame bytes into a recognized inbound message.
    pub fn parse(raw: &[u8]) -> Result<Self, InboundError> {
        let envelope: Envelope = serde_json::from_slice(raw)?;
        match envelope.kind.as_str() {
            MESSAGE_TYPE_GO_TO_LINE => {
                let request: GoToLine = serde_json::from_slice(raw)?;
                if request.line == 0 {
                    return Err(InboundError::ZeroLine);
                }
                Ok(Self::GoToLine(request))
            }
            _ => Err(InboundError::UnknownType(envelope.kind)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn render_frame_shape() {
        let msg = ServerMessage::Render {
            html: String::from("<p>hi</p>"),
            filename: String::from("notes.md"),
            rev: 3,
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "render",
                "html": "<p>hi</p>",
                "filename": "notes.md",
                "rev": 3,
            })
        );
    }

    #[test]
    fn cursor_frame_shape() {
        let msg = ServerMessage::Cursor { line: 12, col: 4, rev: 7 };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], MESSAGE_TYPE_CURSOR);
        assert_eq!(json["line"], 12);
        assert_eq!(json["col"], 4);
        assert_eq!(json["rev"], 7);
        assert_eq!(msg.rev(), 7);
    }

    #[test]
    fn viewer_declaration_covers_both_frames() {
        let decl = ServerMessage::decl();
        assert!(decl.contains("\"render\""));
        assert!(decl.contains("\"cursor\""));
        for field in ["html", "filename", "rev", "line", "col"] {
            assert!(decl.contains(field), "{field} missing from {decl}");
        }
    }

    #[test]
    fn parses_go_to_line() {
        let msg = InboundMessage::parse(br#"{"type":"go_to_line","line":42}"#).unwrap();
        assert_eq!(msg, InboundMessage::GoToLine(GoToLine { line: 42 }));
    }

    #[test]
    fn go_to_line_ignores_extra_fields() {
        let msg = InboundMessage::parse(br#"{"line":5,"type":"go_to_line","source":"dblclick"}"#)
            .unwrap();
        assert_eq!(msg, InboundMessage::GoToLine(GoToLine { line: 5 }));
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            InboundMessage::parse(b"not json at all"),
            Err(InboundError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_missing_type() {
        assert!(matches!(
            InboundMessage::parse(br#"{"line":1}"#),
            Err(InboundError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        let err = InboundMessage::parse(br#"{"type":"scroll","top":10}"#).unwrap_err();
        assert!(matches!(err, InboundError::UnknownType(ref t) if t == "scroll"));
    }

    #[test]
    fn rejects_line_zero() {
        assert!(matches!(
            InboundMessage::parse(br#"{"type":"go_to_line","line":0}"#),
            Err(InboundError::ZeroLine)
        ));
    }

    #[test]
    fn rejects_bad_line_payload() {
        for raw in [
            br#"{"type":"go_to_line"}"#.as_slice(),
            br#"{"type":"go_to_line","line":"ten"}"#.as_slice(),
            br#"{"type":"go_to_line","line":-3}"#.as_slice(),
        ] {
            assert!(matches!(
                InboundMessage::parse(raw),
                Err(InboundError::Malformed(_))
            ));
        }
    }
}
