//! Authorization scheme translation.
//!
//! Clients of the backend only speak Basic/Bearer, while the hub expects
//! `Authorization: token <T>`. The rewrite is applied once and the same
//! header map is then used for both the hub check and the forwarded request.

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};

const BEARER_PREFIX: &[u8] = b"Bearer ";
const TOKEN_PREFIX: &[u8] = b"token ";

/// Rewrite every `Authorization: Bearer <T>` value to `Authorization: token <T>`.
///
/// Values using any other scheme are left alone. Order of repeated values is kept.
pub fn translate_credentials(headers: &mut HeaderMap) {
    if let axum::http::header::Entry::Occupied(mut entry) = headers.entry(AUTHORIZATION) {
        for value in entry.iter_mut() {
            if let Some(rewritten) = rewrite(value) {
                *value = rewritten;
            }
        }
    }
}

fn rewrite(value: &HeaderValue) -> Option<HeaderValue> {
    let token = value.as_bytes().strip_prefix(BEARER_PREFIX)?;
    let mut bytes = Vec::with_capacity(TOKEN_PREFIX.len() + token.len());
    bytes.extend_from_slice(TOKEN_PREFIX);
    bytes.extend_from_slice(token);
    let mut rewritten = HeaderValue::from_bytes(&bytes).ok()?;
    rewritten.set_sensitive(true);
    Some(rewritten)
}
