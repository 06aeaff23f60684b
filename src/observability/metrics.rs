//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, outcome
//! - `proxy_request_duration_seconds` (histogram): latency by method, outcome
//!
//! Without an installed recorder the macros are no-ops.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a request left the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    NotModified,
    Unauthenticated,
    BackendFailure,
    BodyRejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Forwarded => "forwarded",
            Outcome::NotModified => "not_modified",
            Outcome::Unauthenticated => "unauthenticated",
            Outcome::BackendFailure => "backend_failure",
            Outcome::BodyRejected => "body_rejected",
        }
    }
}

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, outcome: Outcome, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Forwarded.as_str(), "forwarded");
        assert_eq!(Outcome::NotModified.as_str(), "not_modified");
        assert_eq!(Outcome::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(Outcome::BackendFailure.as_str(), "backend_failure");
        assert_eq!(Outcome::BodyRejected.as_str(), "body_rejected");
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_request("GET", Outcome::Forwarded, Instant::now());
    }
}
