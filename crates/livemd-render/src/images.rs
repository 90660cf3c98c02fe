//! Image destination rewriting.
//!
//! Local image references are turned into asset URLs so the preview can
//! load them through the gateway's asset route. Anything that already
//! resolves in a browser on its own (remote URLs, inline data, fragment
//! links, existing asset URLs) is left untouched.

use std::path::Path;

use livemd_types::{ASSET_PREFIX, asset_url};

/// Destination prefixes a browser can load without help.
const PASSTHROUGH_PREFIXES: [&str; 7] = [
    "http://", "https://", "data:", "blob:", "file://", "//", "#",
];

/// Rewrite a local image destination into an asset URL.
///
/// Absolute paths are encoded directly. Relative paths are joined to
/// `base_dir`, the directory of the source file; without one they cannot
/// be resolved and are left alone. Returns `None` when the destination
/// should be kept as written.
pub fn rewrite_image_dest(dest: &str, base_dir: Option<&Path>) -> Option<String> {
    let dest = dest.trim();
    if dest.is_empty() || is_passthrough(dest) {
        return None;
    }

    let path = Path::new(dest);
    if path.is_absolute() {
        return asset_url(path);
    }

    asset_url(&base_dir?.join(path))
}

fn is_passthrough(dest: &str) -> bool {
    let lower = dest.to_ascii_lowercase();
    lower.starts_with(ASSET_PREFIX)
        || PASSTHROUGH_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}
