//! Startup orchestration.
//!
//! Config is loaded and validated by the caller; everything here runs only
//! with a usable config, and the listener is bound last.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::{HubAuthority, hub::HubError};
use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{shutdown::Shutdown, signals};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("authority setup failed: {0}")]
    Authority(#[from] HubError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] std::net::AddrParseError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build every subsystem, bind `0.0.0.0:{port}` and serve until a signal arrives.
pub async fn start(config: ProxyConfig) -> Result<(), StartupError> {
    let authority = Arc::new(HubAuthority::from_config(&config)?);

    if let Some(addr) = config.metrics_socket_addr()? {
        metrics::init_metrics(addr)?;
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(port = config.port, "listening at {}", config.port);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config, authority)
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)
}
