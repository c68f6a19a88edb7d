//! The axum host adapter, driven directly and over a real socket.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use switchboard::http::server::dispatch_handler;
use switchboard::http::{build_router, AppState};

mod common;

fn request(method: &str, host: &str, target: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(target)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_handler_renders_text() {
    let state = AppState::new(common::fixture_table());

    let response = dispatch_handler(State(state), request("GET", "routes.dev", "/item/43")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "controller item 43");
}

#[tokio::test]
async fn test_handler_uses_host_header() {
    let state = AppState::new(common::fixture_table());

    let response = dispatch_handler(State(state), request("GET", "routes2.dev", "/name-prefix/")).await;
    assert_eq!(body_text(response).await, "controller routes2 prefix name-prefix");
}

#[tokio::test]
async fn test_handler_maps_errors_to_status() {
    let state = AppState::new(common::fixture_table());

    let response = dispatch_handler(State(state.clone()), request("GET", "routes.dev", "/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "route_not_found");

    let response = dispatch_handler(State(state), request("TRACE", "routes.dev", "/")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_server_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(AppState::new(common::fixture_table()));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /items/ HTTP/1.1\r\nHost: routes.dev\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);

    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {}", raw);
    assert!(raw.ends_with("controller items"));
}
