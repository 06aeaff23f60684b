//! The seam between the proxy and whoever vouches for callers.

use async_trait::async_trait;
use axum::http::{HeaderMap, Uri};
use serde::{Deserialize, Serialize};

/// A caller the authority has vouched for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    /// User or service name.
    pub name: String,

    /// "user" or "service" for JupyterHub; absent for other authorities.
    #[serde(default)]
    pub kind: Option<String>,
}

impl Identity {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some("user".to_string()),
        }
    }
}

/// Resolves the caller behind a set of request headers.
///
/// Headers arrive with credentials already translated to the `token` scheme.
/// Returning `None` rejects the request.
#[async_trait]
pub trait Authority: Send + Sync {
    async fn resolve_identity(&self, headers: &HeaderMap) -> Option<Identity>;

    /// Resolve with the request URI in view, for authorities that also read
    /// credentials from the query string. Defaults to the headers alone.
    async fn resolve_request(&self, headers: &HeaderMap, _uri: &Uri) -> Option<Identity> {
        self.resolve_identity(headers).await
    }
}
