//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, GET/POST on every path)
//!     → [auth: translate credentials, resolve identity]
//!     → forward.rs (build proxied request, call backend)
//!     → response.rs (relay or map the outcome)
//!     → Send to client
//! ```

pub mod forward;
pub mod response;
pub mod server;

pub use forward::{BackendOutcome, ForwardError, Forwarder, ProxiedRequest};
pub use server::{AppState, HttpServer};
