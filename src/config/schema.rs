//! Configuration schema definitions.

use std::net::{AddrParseError, SocketAddr};

use serde::{Deserialize, Serialize};

/// Default port the proxy listens on.
pub const DEFAULT_PORT: u16 = 8700;

/// Default base URL of the JupyterHub REST API.
pub const DEFAULT_HUB_API_URL: &str = "http://127.0.0.1:8081/hub/api";

/// Default cap on buffered POST bodies (100 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Root configuration for the proxy.
#[derive(Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Service credential used when talking to the hub.
    pub api_token: String,

    /// Backend origin (e.g., "127.0.0.1:5000").
    pub target: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Hub REST API base URL.
    #[serde(default = "default_hub_api_url")]
    pub hub_api_url: String,

    /// Maximum accepted POST body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Prometheus scrape address; metrics are not exported when unset.
    #[serde(default)]
    pub metrics_address: Option<String>,
}

impl ProxyConfig {
    /// Build a config with defaults for everything but the two required values.
    pub fn new(api_token: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            target: target.into(),
            port: DEFAULT_PORT,
            hub_api_url: DEFAULT_HUB_API_URL.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            metrics_address: None,
        }
    }

    /// The parsed exporter address, if one is configured.
    pub fn metrics_socket_addr(&self) -> Result<Option<SocketAddr>, AddrParseError> {
        self.metrics_address
            .as_deref()
            .map(|addr| addr.trim().parse())
            .transpose()
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("api_token", &"<redacted>")
            .field("target", &self.target)
            .field("port", &self.port)
            .field("hub_api_url", &self.hub_api_url)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("metrics_address", &self.metrics_address)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_hub_api_url() -> String {
    DEFAULT_HUB_API_URL.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}
