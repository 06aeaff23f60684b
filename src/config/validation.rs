//! Configuration validation.
//!
//! Returns every problem found, not just the first.

use thiserror::Error;

use crate::config::schema::ProxyConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api token is empty")]
    EmptyToken,

    #[error("target is empty")]
    EmptyTarget,

    #[error("target must be host:port without scheme or path, got {0:?}")]
    MalformedTarget(String),

    #[error("port must be non-zero")]
    ZeroPort,

    #[error("hub api url must be an http(s) URL, got {0:?}")]
    MalformedHubUrl(String),

    #[error("max body size must be non-zero")]
    ZeroBodyLimit,

    #[error("metrics address must be ip:port, got {0:?}")]
    MalformedMetricsAddress(String),
}

/// Semantic checks on a parsed config.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.api_token.trim().is_empty() {
        errors.push(ValidationError::EmptyToken);
    }

    if config.target.trim().is_empty() {
        errors.push(ValidationError::EmptyTarget);
    } else if config.target.contains("://") || config.target.contains('/') {
        errors.push(ValidationError::MalformedTarget(config.target.clone()));
    } else if config
        .target
        .parse::<axum::http::uri::Authority>()
        .is_err()
    {
        errors.push(ValidationError::MalformedTarget(config.target.clone()));
    }

    if config.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    match url::Url::parse(&config.hub_api_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::MalformedHubUrl(config.hub_api_url.clone())),
    }

    if config.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.metrics_socket_addr().is_err() {
        errors.push(ValidationError::MalformedMetricsAddress(
            config.metrics_address.clone().unwrap_or_default(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
