//! Test utilities for smartcar-client.
//!
//! Provides an in-process mock of the Smartcar API so integration tests can
//! exercise the real client over real HTTP. Stub the routes a test needs,
//! point a [`crate::Vehicle`] at [`MockSmartcarServer::base_url`], then
//! inspect the recorded requests to assert what went over the wire.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::error::Result;

/// A canned response for one method + path.
#[derive(Debug, Clone)]
pub struct Stub {
    method: String,
    path: String,
    status: u16,
    headers: Vec<(String, String)>,
    body: Value,
}

impl Stub {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status: 200,
            headers: Vec::new(),
            body: Value::Null,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// A request the mock server received, decoded for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Header value by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decoded query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct ServerState {
    stubs: Mutex<Vec<Stub>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Smartcar API server that shuts down when dropped.
pub struct MockSmartcarServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockSmartcarServer {
    /// Bind to an ephemeral local port and start serving stubs.
    pub async fn start() -> Result<Self> {
        let state = Arc::new(ServerState::default());
        let router: Router = Router::new()
            .fallback(handle_request)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start accepting.
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register a canned response. Later stubs do not shadow earlier ones;
    /// the first stub matching method + path wins.
    pub fn stub(&self, stub: Stub) {
        self.state
            .stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stub);
    }

    /// Everything received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().into_iter().last()
    }

    /// Shutdown the server gracefully.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockSmartcarServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn handle_request(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = uri
        .query()
        .map(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    };
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    let stub = state
        .stubs
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|stub| stub.method.eq_ignore_ascii_case(method.as_str()) && stub.path == uri.path())
        .cloned();

    match stub {
        Some(stub) => stub_response(&stub),
        None => stub_response(
            &Stub::new(method.as_str(), uri.path()).status(404).body(json!({
                "type": "RESOURCE_NOT_FOUND",
                "code": null,
                "description": format!("No stub registered for {} {}", method, uri.path()),
                "statusCode": 404
            })),
        ),
    }
}

fn stub_response(stub: &Stub) -> Response {
    let status = StatusCode::from_u16(stub.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    let mut has_content_type = false;
    let mut has_request_id = false;
    for (name, value) in &stub.headers {
        has_content_type |= name.eq_ignore_ascii_case("content-type");
        has_request_id |= name.eq_ignore_ascii_case("sc-request-id");
        builder = builder.header(name, value);
    }
    if !has_content_type {
        builder = builder.header("content-type", "application/json; charset=utf-8");
    }
    if !has_request_id {
        builder = builder.header("sc-request-id", uuid::Uuid::new_v4().to_string());
    }
    let body = if stub.body.is_null() {
        String::new()
    } else {
        stub.body.to_string()
    };
    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_builder_collects_fields() {
        let stub = Stub::new("GET", "/v2.0/vehicles/veh_1/odometer")
            .status(409)
            .header("retry-after", "30")
            .body(json!({"pizza": "pasta"}));
        assert_eq!(stub.method, "GET");
        assert_eq!(stub.status, 409);
        assert_eq!(stub.headers.len(), 1);
    }

    #[tokio::test]
    async fn unmatched_requests_get_a_404() {
        let server = MockSmartcarServer::start().await.unwrap();
        let response = reqwest::get(format!("{}/nope", server.base_url()))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
        assert_eq!(server.requests().len(), 1);
        server.shutdown().await;
    }
}
