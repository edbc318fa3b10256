//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Declaration (at startup):
//!     RouteRegistrar (fluent calls: route/get/post/.../group)
//!     → RouteDefinition[] (method, path, middleware snapshot, handlers)
//!     → attach_to() compiles into the underlying axum Router
//!     → frozen; no dynamic unregistration
//!
//! Per request:
//!     axum matches (method, path)
//!     → pipeline.rs builds the Context and drives the chain
//!     → stages run in registration order; first writer wins
//! ```
//!
//! # Design Decisions
//! - Prefixes concatenate verbatim; no normalization
//! - Group middleware runs before child-specific middleware, in
//!   declaration order
//! - Registration failures are errors with the original reason preserved

pub mod pipeline;
pub mod registrar;

pub use pipeline::{Handler, IntoHandlerChain, Next, StageFuture};
pub use registrar::{RouteDefinition, RouteRegistrar};
