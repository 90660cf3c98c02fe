//! Local asset serving.
//!
//! Rendered HTML refers to local files (images, mostly) through
//! `/@mdfs/<id>` URLs where `<id>` is an encoded absolute path (see
//! [`livemd_types::asset`]). There is no web root: a request is served if
//! the decoded path is absolute and names an existing file that is not a
//! directory. Every other outcome is a plain 404. Methods other than
//! `GET`/`HEAD` are rejected with 405 by the router.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use livemd_types::asset::{DecodeError, decode_asset_id};
use tower::ServiceExt as _;
use tower_http::services::ServeFile;
use tracing::debug;

/// Why an asset request could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The identifier did not decode to an absolute path.
    #[error("bad asset identifier: {0}")]
    Decode(#[from] DecodeError),

    /// Nothing exists at the decoded path.
    #[error("asset not found: {}", .path.display())]
    Missing {
        /// The decoded path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The decoded path is a directory.
    #[error("asset is a directory: {}", .0.display())]
    Directory(PathBuf),
}

impl IntoResponse for AssetError {
    fn into_response(self) -> Response {
        debug!(error = %self, "asset request rejected");
        (StatusCode::NOT_FOUND, "404 page not found").into_response()
    }
}

/// Decode an asset identifier and check it names a servable file.
pub async fn resolve_asset(id: &str) -> Result<PathBuf, AssetError> {
    let path = decode_asset_id(id)?;
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => Err(AssetError::Directory(path)),
        Ok(_) => Ok(path),
        Err(source) => Err(AssetError::Missing { path, source }),
    }
}

/// Serve the file named by an asset identifier.
///
/// Content type is guessed from the file extension; `HEAD` returns headers
/// only.
///
/// # Route
///
/// `GET|HEAD /@mdfs/{id}`
pub async fn serve_asset(Path(id): Path<String>, request: Request) -> Response {
    let path = match resolve_asset(&id).await {
        Ok(path) => path,
        Err(e) => return e.into_response(),
    };

    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
