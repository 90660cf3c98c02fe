//! Integration tests for the preview gateway's HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. No sync loop is running; the HTTP routes never
//! talk to it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use livemd_server::QueueCapacities;
use livemd_server::actor;
use livemd_server::router::{GatewayState, build_router};
use livemd_server::ws::SocketSink;
use livemd_types::{asset_url, encode_asset_path};
use tower::ServiceExt;

const SHELL: &str = "<!doctype html><html><body><main id=\"content\"></main></body></html>";

fn make_router() -> axum::Router {
    let (_publisher, gateway, _inbox) = actor::channels::<SocketSink>(QueueCapacities::default());
    build_router(Arc::new(GatewayState::new(SHELL, gateway)))
}

async fn send(method: Method, uri: &str) -> axum::response::Response {
    make_router()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_serves_shell_as_html() {
    let response = send(Method::GET, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    assert_eq!(body_bytes(response).await, SHELL.as_bytes());
}

#[tokio::test]
async fn index_is_identical_across_requests() {
    let first = body_bytes(send(Method::GET, "/").await).await;
    let second = body_bytes(send(Method::GET, "/").await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = send(Method::GET, "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ws_without_upgrade_is_rejected() {
    let response = send(Method::GET, "/ws").await;
    assert!(response.status().is_client_error());
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn asset_serves_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pic.png");
    std::fs::write(&file, b"\x89PNG fake").unwrap();

    let response = send(Method::GET, &asset_url(&file).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(body_bytes(response).await, b"\x89PNG fake");
}

#[tokio::test]
async fn asset_head_returns_headers_only() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, b"hello").unwrap();

    let response = send(Method::HEAD, &asset_url(&file).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).unwrap(),
        "5"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn asset_post_is_method_not_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pic.png");
    std::fs::write(&file, b"png").unwrap();

    let response = send(Method::POST, &asset_url(&file).unwrap()).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn asset_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let url = asset_url(&dir.path().join("gone.png")).unwrap();

    let response = send(Method::GET, &url).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asset_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let url = asset_url(dir.path()).unwrap();

    let response = send(Method::GET, &url).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asset_relative_path_is_not_found() {
    // base64url("docs/a.png")
    let response = send(Method::GET, "/@mdfs/ZG9jcy9hLnBuZw").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asset_garbage_identifier_is_not_found() {
    let response = send(Method::GET, "/@mdfs/!!not-base64!!").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asset_empty_identifier_is_not_found() {
    let response = send(Method::GET, "/@mdfs/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn encoded_identifier_is_url_safe() {
    let id = encode_asset_path(std::path::Path::new("/tmp/a b/ü?.png")).unwrap();
    assert!(
        id.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    );
}
