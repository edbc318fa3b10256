//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce structured log events (tracing)
//!     → logging.rs (subscriber setup: filter, format)
//!     → stdout (pretty for development, JSON for production)
//! ```
//!
//! # Design Decisions
//! - Structured key-value fields on every lifecycle/registration/dispatch event
//! - Request IDs come from the middleware facility and flow through
//!   tower-http's trace layer
//! - No metrics endpoint at this layer

pub mod logging;
