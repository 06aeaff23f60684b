//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay a successful backend reply to the caller
//! - Map every other forward outcome to the caller-facing status
//!
//! # Design Decisions
//! - Repeated headers are appended, never overwritten
//! - Hop-by-hop framing headers are left to the serving layer
//! - Content-Type is re-set last so the serving layer cannot substitute its own

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};

fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == header::TRANSFER_ENCODING || *name == header::CONNECTION || name.as_str() == "keep-alive"
}

/// Build the caller's response from a successful backend reply.
pub fn relay(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers.get(header::CONTENT_TYPE).cloned();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let out = response.headers_mut();
    // Iterating by value yields the name only on the first of repeated values.
    let mut current: Option<HeaderName> = None;
    for (name, value) in headers {
        if let Some(name) = name {
            current = Some(name);
        }
        let Some(name) = current.as_ref() else { continue };
        if is_hop_by_hop(name) {
            continue;
        }
        out.append(name.clone(), value);
    }

    if let Some(content_type) = content_type {
        out.insert(header::CONTENT_TYPE, content_type);
    }

    response
}

/// Backend answered 304: finish with an empty, successful response.
pub fn not_modified() -> Response {
    StatusCode::OK.into_response()
}

/// Backend failure of any other kind. Detail stays in the logs.
pub fn backend_failure() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Caller could not be authenticated.
pub fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}
