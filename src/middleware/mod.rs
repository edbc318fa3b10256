//! Cross-cutting middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (code or config)
//!     → facility.rs (queue named concerns with passthrough options)
//!     → apply() wraps the application router with tower-http layers
//!     → per request: facility middleware (registration order)
//!       → route pipeline (routing subsystem)
//! ```
//!
//! # Design Decisions
//! - Options pass through verbatim; the facility validates nothing beyond
//!   deserialization
//! - A concern whose backing package is not linked fails loudly, naming
//!   the package
//! - Queue application is atomic: all-or-nothing per `apply`

pub mod facility;
pub mod options;

pub use facility::MiddlewareFacility;
pub use options::{BodyLimitOptions, CorsOptions, TimeoutOptions};
