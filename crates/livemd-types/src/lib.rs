//! Shared type definitions for livemd.
//!
//! This crate is the single source of truth for everything that crosses a
//! boundary: the JSON frames exchanged with browser viewers, the render and
//! cursor state owned by the synchronization loop, and the reversible asset
//! identifiers that stand in for local file paths inside rendered HTML.
//! Wire types derive `ts-rs` declarations so the viewer script's frame
//! handling can be checked against them.
//!
//! # Modules
//!
//! - [`messages`] -- Server-to-viewer and viewer-to-server frames
//! - [`state`] -- Latest render snapshot and cursor position
//! - [`asset`] -- Asset identifier codec and lexical path cleaning

pub mod asset;
pub mod messages;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use asset::{ASSET_PREFIX, DecodeError, asset_url, clean_path, decode_asset_id, encode_asset_path};
pub use messages::{GoToLine, InboundError, InboundMessage, ServerMessage};
pub use state::{CursorPosition, CursorState, RenderState};
