//! Configuration loading from the process environment.

use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const API_TOKEN_VAR: &str = "JUPYTERHUB_API_TOKEN";
pub const TARGET_VAR: &str = "MLFLOW_JUPYTERHUB_AUTH_TARGET";
pub const PORT_VAR: &str = "MLFLOW_JUPYTERHUB_AUTH_PORT";
pub const HUB_API_URL_VAR: &str = "JUPYTERHUB_API_URL";
pub const MAX_BODY_BYTES_VAR: &str = "MLFLOW_JUPYTERHUB_AUTH_MAX_BODY_BYTES";
pub const METRICS_ADDR_VAR: &str = "MLFLOW_JUPYTERHUB_AUTH_METRICS_ADDR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("set {0}")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load_with(|name| std::env::var(name).ok())
}

/// Load and validate configuration from an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let api_token = read(API_TOKEN_VAR).ok_or(ConfigError::Missing(API_TOKEN_VAR))?;
    let target = read(TARGET_VAR).ok_or(ConfigError::Missing(TARGET_VAR))?;

    let mut config = ProxyConfig::new(api_token, target.trim());

    if let Some(port) = read(PORT_VAR) {
        config.port = parse(PORT_VAR, &port)?;
    }
    if let Some(url) = read(HUB_API_URL_VAR) {
        config.hub_api_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(limit) = read(MAX_BODY_BYTES_VAR) {
        config.max_body_bytes = parse(MAX_BODY_BYTES_VAR, &limit)?;
    }
    config.metrics_address = read(METRICS_ADDR_VAR);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
