//! Caller authentication.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → credentials.rs (Bearer → token rewrite, in place)
//!     → authority.rs (Authority::resolve_identity)
//!     → hub.rs (JupyterHub REST check)
//!     → Some(Identity) | None
//! ```

pub mod authority;
pub mod credentials;
pub mod hub;

pub use authority::{Authority, Identity};
pub use credentials::translate_credentials;
pub use hub::HubAuthority;
