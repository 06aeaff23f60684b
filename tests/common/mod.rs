//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse, Response},
    Router,
};
use mlflow_jupyterhub_auth::{Authority, HttpServer, Identity, ProxyConfig, Shutdown};
use tokio::net::TcpListener;

/// What the mock backend received.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub type CaptureLog = Arc<Mutex<Vec<Captured>>>;

/// Start a backend that records every request and answers by path:
/// `/json` → JSON with repeated headers, `/not-modified` → 304,
/// `/error` → 500, `/missing` → 404, `/created` → 201, `/old` → 307 to `/new`,
/// `/see-other` → 303 to `/new`, `/loop` → 302 to itself, `/new` → "moved-content",
/// anything else → 200 "ok".
pub async fn start_mock_backend() -> (SocketAddr, CaptureLog) {
    let log: CaptureLog = Arc::default();
    let app = Router::new().fallback(capture).with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, log)
}

async fn capture(State(log): State<CaptureLog>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let path = parts.uri.path().to_string();
    log.lock().unwrap().push(Captured {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });

    match path.as_str() {
        "/json" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            AppendHeaders([("x-custom", "a"), ("x-custom", "b")]),
            r#"{"ok":true}"#,
        )
            .into_response(),
        "/not-modified" => StatusCode::NOT_MODIFIED.into_response(),
        "/error" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "/missing" => (StatusCode::NOT_FOUND, "no such run").into_response(),
        "/created" => (StatusCode::CREATED, "made").into_response(),
        "/old" => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/new")]).into_response(),
        "/see-other" => (StatusCode::SEE_OTHER, [(header::LOCATION, "/new")]).into_response(),
        "/loop" => (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response(),
        "/new" => "moved-content".into_response(),
        _ => "ok".into_response(),
    }
}

/// Accepts a single token (in the translated `token` scheme) and counts calls.
pub struct TokenAuthority {
    valid: &'static str,
    pub calls: AtomicUsize,
}

impl TokenAuthority {
    pub fn new(valid: &'static str) -> Arc<Self> {
        Arc::new(Self {
            valid,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authority for TokenAuthority {
    async fn resolve_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("token ")?;
        (token == self.valid).then(|| Identity::user("alice"))
    }
}

/// A running proxy; shuts down when dropped.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig, authority: Arc<dyn Authority>) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, authority);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
