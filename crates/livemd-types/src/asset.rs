//! Reversible asset identifiers for local files referenced by rendered HTML.
//!
//! An identifier is the absolute, lexically cleaned path encoded with the
//! URL-safe base64 alphabet without padding. It is placed under
//! [`ASSET_PREFIX`] so the gateway can route it. Decoding reverses the
//! encoding and cleans the result again; callers must still check that the
//! path names an existing regular file before serving it.

use std::path::{Component, Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// URL prefix under which asset identifiers are served.
pub const ASSET_PREFIX: &str = "/@mdfs/";

/// Errors produced when decoding an asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The identifier is empty.
    #[error("empty asset identifier")]
    Empty,

    /// The identifier is not valid unpadded URL-safe base64, or the decoded
    /// bytes are not UTF-8.
    #[error("invalid asset identifier encoding")]
    Encoding,

    /// The decoded path is not absolute.
    #[error("asset path is not absolute: {0}")]
    NotAbsolute(PathBuf),
}

/// Lexically clean a path.
///
/// Removes `.` components, collapses repeated separators and resolves `..`
/// against preceding normal components. `..` directly under the root is
/// dropped. An empty result becomes `.`. The filesystem is never touched.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Encode an absolute path into an asset identifier.
///
/// Returns `None` for relative paths and paths that are not valid UTF-8.
pub fn encode_asset_path(path: &Path) -> Option<String> {
    let cleaned = clean_path(path);
    if !cleaned.is_absolute() {
        return None;
    }
    let text = cleaned.to_str()?;
    Some(URL_SAFE_NO_PAD.encode(text.as_bytes()))
}

/// Build the full asset URL (`/@mdfs/<id>`) for an absolute path.
pub fn asset_url(path: &Path) -> Option<String> {
    encode_asset_path(path).map(|id| format!("{ASSET_PREFIX}{id}"))
}

/// Decode an asset identifier back into an absolute, cleaned path.
pub fn decode_asset_id(id: &str) -> Result<PathBuf, DecodeError> {
    let id = id.strip_prefix(ASSET_PREFIX).unwrap_or(id);
    if id.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(id.as_bytes())
        .map_err(|_err| DecodeError::Encoding)?;
    let text = String::from_utf8(bytes).map_err(|_err| DecodeError::Encoding)?;

    let path = clean_path(Path::new(&text));
    if !path.is_absolute() {
        return Err(DecodeError::NotAbsolute(path));
    }
    Ok(path)
}
