//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request handler
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (only when configured)
//! ```

pub mod logging;
pub mod metrics;
