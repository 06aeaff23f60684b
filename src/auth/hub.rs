//! JupyterHub as the authority.
//!
//! # Responsibilities
//! - Pull the user token out of `?token=<T>` or `Authorization: token <T>`
//! - Ask the hub who owns it, authenticating as this service
//! - Map hub replies onto `Option<Identity>`

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, Uri};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::auth::authority::{Authority, Identity};
use crate::config::ProxyConfig;

/// Errors building the hub client.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("invalid hub api url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("hub api url {0:?} cannot carry a path")]
    NotABase(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Checks tokens against the hub's REST API.
#[derive(Clone)]
pub struct HubAuthority {
    client: reqwest::Client,
    api_url: Url,
    api_token: String,
}

impl HubAuthority {
    pub fn new(api_url: &str, api_token: impl Into<String>) -> Result<Self, HubError> {
        let api_url = Url::parse(api_url).map_err(|source| HubError::Url {
            url: api_url.to_string(),
            source,
        })?;
        if api_url.cannot_be_a_base() {
            return Err(HubError::NotABase(api_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_token: api_token.into(),
        })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, HubError> {
        Self::new(&config.hub_api_url, config.api_token.clone())
    }

    /// `{api_url}/authorizations/token/{token}`, with the token percent-encoded.
    fn token_url(&self, token: &str) -> Url {
        let mut url = self.api_url.clone();
        // new() rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["authorizations", "token", token]);
        }
        url
    }

    async fn identity_for_token(&self, token: &str) -> Option<Identity> {
        let response = match self
            .client
            .get(self.token_url(token))
            .header(AUTHORIZATION, format!("token {}", self.api_token))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reach hub api");
                return None;
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<Identity>().await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed identity from hub api");
                    None
                }
            },
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                tracing::debug!(status = %response.status(), "Hub rejected token");
                None
            }
            status => {
                tracing::warn!(status = %status, "Unexpected hub api response");
                None
            }
        }
    }
}

#[async_trait]
impl Authority for HubAuthority {
    async fn resolve_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = token_from_headers(headers)?;
        self.identity_for_token(token).await
    }

    /// The `token` query parameter wins over the Authorization header.
    async fn resolve_request(&self, headers: &HeaderMap, uri: &Uri) -> Option<Identity> {
        match token_from_query(uri) {
            Some(token) => self.identity_for_token(&token).await,
            None => self.resolve_identity(headers).await,
        }
    }
}

/// Token carried as `?token=<T>`, percent-decoded.
fn token_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Token carried as `Authorization: token <T>` (scheme is case-insensitive).
fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
