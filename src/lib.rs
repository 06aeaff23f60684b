//! Authenticating reverse proxy for MLflow behind JupyterHub.
//!
//! Every GET and POST is checked against the hub before being forwarded to
//! the tracking server; `Authorization: Bearer <T>` is rewritten to the hub's
//! `Authorization: token <T>` on the way.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use auth::{Authority, HubAuthority, Identity};
pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
