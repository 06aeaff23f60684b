//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read & parse)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to the server and the authority at construction
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - Required values have no defaults; a missing one aborts startup
//! - Validation separates parsing from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_with, ConfigError};
pub use schema::ProxyConfig;
pub use validation::{validate_config, ValidationError};
