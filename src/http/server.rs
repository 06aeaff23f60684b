//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router binding GET and POST on every path
//! - Wire up middleware (tracing)
//! - Authenticate, forward and relay each request
//!
//! Per request the flow is strictly linear: authenticate → rewrite
//! credentials → forward → relay. Nothing is shared between requests except
//! the immutable state below and the backend connection pool.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{request::Parts, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::auth::{translate_credentials, Authority};
use crate::config::ProxyConfig;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::http::forward::{BackendOutcome, Forwarder, ProxiedRequest};
use crate::http::response;
use crate::observability::metrics::{self, Outcome};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<str>,
    pub authority: Arc<dyn Authority>,
    pub forwarder: Forwarder,
    pub max_body_bytes: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server from config and an authority.
    pub fn new(config: ProxyConfig, authority: Arc<dyn Authority>) -> Self {
        let state = AppState {
            target: Arc::from(config.target.as_str()),
            authority,
            forwarder: Forwarder::new(),
            max_body_bytes: config.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    fn build_router(state: AppState) -> Router {
        // axum answers HEAD with the GET handler unless told otherwise.
        let proxied: MethodRouter<AppState> = get(proxy_handler).post(proxy_handler).head(method_not_allowed);
        Router::new()
            .route("/", proxied.clone())
            .route("/{*path}", proxied)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.target,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let Parts {
        method,
        uri,
        mut headers,
        ..
    } = parts;
    let method_str = method.as_str().to_owned();

    // 1. Authenticate
    translate_credentials(&mut headers);
    let Some(identity) = state.authority.resolve_request(&headers, &uri).await else {
        tracing::warn!(method = %method, path = %uri.path(), "Request not authenticated");
        metrics::record_request(&method_str, Outcome::Unauthenticated, start);
        return response::forbidden();
    };

    // 2. Construct the proxied request
    let body = if method == Method::POST {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(user = %identity.name, error = %e, "Failed to read request body");
                metrics::record_request(&method_str, Outcome::BodyRejected, start);
                return body_error_response(&e);
            }
        }
    } else {
        Bytes::new()
    };

    let proxied = match ProxiedRequest::new(&state.target, method, &uri, headers, body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(user = %identity.name, error = %e, "Failed to build backend request");
            metrics::record_request(&method_str, Outcome::BackendFailure, start);
            return response::backend_failure();
        }
    };

    tracing::debug!(
        user = %identity.name,
        method = %proxied.method,
        uri = %proxied.uri,
        "Forwarding request"
    );

    // 3. Forward, 4. Relay
    match state.forwarder.forward(proxied).await {
        BackendOutcome::Success {
            status,
            headers,
            body,
        } => {
            metrics::record_request(&method_str, Outcome::Forwarded, start);
            response::relay(status, headers, body)
        }
        BackendOutcome::NotModified => {
            metrics::record_request(&method_str, Outcome::NotModified, start);
            response::not_modified()
        }
        BackendOutcome::Failure(e) => {
            tracing::warn!(user = %identity.name, error = %e, "Backend request failed");
            metrics::record_request(&method_str, Outcome::BackendFailure, start);
            response::backend_failure()
        }
    }
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

fn body_error_response(err: &axum::Error) -> Response {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
        source = e.source();
    }
    StatusCode::BAD_REQUEST.into_response()
}
