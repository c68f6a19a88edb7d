//! HTTP host adapter.
//!
//! # Responsibilities
//! - Create an Axum Router with a single catch-all handler
//! - Rebuild the absolute request URL from the Host header
//! - Dispatch through a per-request [`Dispatcher`] clone
//! - Render handler output as text or JSON and errors as status codes
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::dispatch::{Dispatcher, Resolver};
use crate::error::RouterError;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            dispatcher: Dispatcher::new(table),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.dispatcher = self.dispatcher.with_resolver(resolver);
        self
    }
}

/// HTTP server exposing a route table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with the trace layer.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(dispatch_handler))
        .route("/", any(dispatch_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Catch-all handler: every request goes through the route table.
pub async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let url = absolute_url(request.headers(), request.uri());
    let method = request.method().as_str().to_string();

    // One dispatcher per request keeps last-route bookkeeping private.
    let mut dispatcher = state.dispatcher.clone();
    match dispatcher.dispatch(&method, &url) {
        Ok(response) => render(response),
        Err(err) => render_error(&err),
    }
}

/// `scheme://host/path?query` as the client addressed it.
///
/// The scheme comes from `X-Forwarded-Proto` when a front proxy set it.
pub fn absolute_url(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    format!("{}://{}{}", scheme, host, path)
}

fn render(response: Value) -> Response {
    match response {
        Value::String(body) => (StatusCode::OK, body).into_response(),
        Value::Null => StatusCode::NO_CONTENT.into_response(),
        other => (StatusCode::OK, Json(other)).into_response(),
    }
}

fn render_error(err: &RouterError) -> Response {
    let kind = err.kind();
    let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "dispatch failed");
    }
    (status, Json(json!({ "error": kind, "message": err.to_string() }))).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "routes.dev".parse().unwrap());
        let uri: Uri = "/item/43?x=1".parse().unwrap();
        assert_eq!(absolute_url(&headers, &uri), "http://routes.dev/item/43?x=1");

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(absolute_url(&headers, &uri), "https://routes.dev/item/43?x=1");
    }

    #[test]
    fn test_error_status() {
        let response = render_error(&RouterError::RouteNotFound { url: "x".into() });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = render_error(&RouterError::MethodNotExist {
            class: "A".into(),
            method: "b".into(),
        });
        assert_eq!(response.status().as_u16(), 406);
    }
}
