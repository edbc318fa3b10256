//! Unified request/response context.
//!
//! # Data Flow
//! ```text
//! Matched axum Request
//!     → unified.rs (snapshot request fields, buffer body)
//!     → Context handed through the pipeline stages
//!     → response side mutated by stages (status, headers, body)
//!     → into_response() emits the final axum Response
//! ```
//!
//! # Design Decisions
//! - Explicit merged view, not a transparent proxy: lookups check the
//!   response side first, then the request side
//! - Request state is a snapshot taken at construction
//! - The continuation signal travels beside the context, never inside it

pub mod unified;

pub use unified::Context;
