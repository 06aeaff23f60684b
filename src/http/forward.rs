//! Backend forwarding.
//!
//! # Responsibilities
//! - Build the proxied request (`http://{target}{uri}`)
//! - Issue it over the shared, pooled client
//! - Classify the reply into a `BackendOutcome`
//!
//! # Design Decisions
//! - One attempt per request: no retries, no deadline beyond the transport's
//! - Redirects (301/302/303/307/308) are followed, at most `MAX_REDIRECTS` hops
//! - Framing headers are dropped and recomputed by the client from the body
//! - Success bodies are buffered so a truncated reply surfaces as a failure

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

/// Why a forward did not produce a relayable response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid backend request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("backend request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("backend responded with {0}")]
    Status(StatusCode),

    #[error("backend redirect has no usable location: {0}")]
    BadRedirect(String),

    #[error("more than {0} backend redirects")]
    TooManyRedirects(usize),

    #[error("failed to read backend body: {0}")]
    Body(#[from] hyper::Error),
}

/// Result of a single backend call.
#[derive(Debug)]
pub enum BackendOutcome {
    Success {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    NotModified,
    Failure(ForwardError),
}

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Request-scoped pieces handed to the forwarder.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxiedRequest {
    /// Point an inbound request at the backend.
    ///
    /// Path and query are copied verbatim. Only POST keeps its body.
    pub fn new(
        target: &str,
        method: Method,
        inbound_uri: &Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Self, ForwardError> {
        let path_and_query = inbound_uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = Uri::builder()
            .scheme("http")
            .authority(target)
            .path_and_query(path_and_query)
            .build()?;

        let body = if method == Method::POST {
            body
        } else {
            Bytes::new()
        };

        Ok(Self {
            method,
            uri,
            headers,
            body,
        })
    }

    fn to_request(&self) -> Result<Request<Body>, ForwardError> {
        let mut headers = self.headers.clone();
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(self.uri.clone())
            .body(Body::from(self.body.clone()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    /// The request to send after a redirect to `location`.
    ///
    /// 302 and 303 turn into a bodiless GET; 301, 307 and 308 keep method and body.
    /// Host is dropped so the client derives it from the new URI.
    fn redirected(mut self, status: StatusCode, location: Uri) -> Self {
        if status == StatusCode::FOUND || status == StatusCode::SEE_OTHER {
            self.method = Method::GET;
            self.body = Bytes::new();
            self.headers.remove(header::CONTENT_TYPE);
            self.headers.remove(header::CONTENT_ENCODING);
        }
        self.headers.remove(header::HOST);
        self.uri = location;
        self
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve a `Location` header against the URI that produced it.
fn redirect_target(current: &Uri, headers: &HeaderMap) -> Result<Uri, ForwardError> {
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ForwardError::BadRedirect("missing location".to_string()))?;

    let base = url::Url::parse(&current.to_string())
        .map_err(|e| ForwardError::BadRedirect(e.to_string()))?;
    let next = base
        .join(location)
        .map_err(|e| ForwardError::BadRedirect(format!("{}: {}", location, e)))?;

    next.as_str()
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| ForwardError::BadRedirect(e.to_string()))
}

/// Shared client for backend calls.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Send the request and classify the reply.
    pub async fn forward(&self, proxied: ProxiedRequest) -> BackendOutcome {
        match self.try_forward(proxied).await {
            Ok(outcome) => outcome,
            Err(e) => BackendOutcome::Failure(e),
        }
    }

    async fn try_forward(&self, proxied: ProxiedRequest) -> Result<BackendOutcome, ForwardError> {
        let mut current = proxied;
        let mut redirects = 0;

        let response = loop {
            let response = self.client.request(current.to_request()?).await?;
            let status = response.status();

            if !is_followed_redirect(status) {
                break response;
            }
            if redirects == MAX_REDIRECTS {
                return Err(ForwardError::TooManyRedirects(MAX_REDIRECTS));
            }

            let location = redirect_target(&current.uri, response.headers())?;
            tracing::debug!(status = %status, from = %current.uri, to = %location, "Following backend redirect");
            current = current.redirected(status, location);
            redirects += 1;
        };

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(BackendOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(ForwardError::Status(status));
        }

        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();

        Ok(BackendOutcome::Success {
            status,
            headers: parts.headers,
            body,
        })
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}
