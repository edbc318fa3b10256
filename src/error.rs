//! Crate-wide error taxonomy.
//!
//! # Responsibilities
//! - Distinguish initialization, registration, dependency and handler errors
//! - Preserve the original message when wrapping a lower-level failure
//! - Carry validation failures as a field → reason mapping
//!
//! # Design Decisions
//! - One enum, descriptive messages, no numeric error codes
//! - Errors are always surfaced, never silently swallowed

use std::collections::BTreeMap;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the application layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The application was used before `initialize()` / `launch()`.
    #[error("application not initialized: call initialize() or launch() first")]
    NotInitialized,

    /// An operation requiring a working path ran before `route()` set one.
    #[error("base route not set: call route() before {operation}")]
    BaseRouteNotSet { operation: String },

    /// Registering a route with the underlying router failed.
    #[error("route registration failed for {method} {path}: {reason}")]
    RouteRegistration {
        method: Method,
        path: String,
        reason: String,
    },

    /// A middleware's backing package is not linked into this build.
    #[error("middleware '{name}' requires package '{package}' which is not installed")]
    MissingDependency { name: String, package: String },

    /// Middleware options could not be deserialized.
    #[error("invalid options for middleware '{name}': {reason}")]
    MiddlewareOptions { name: String, reason: String },

    /// The request body exceeded the context's buffering cap.
    #[error("request body for {path} exceeds the {limit}-byte buffer limit")]
    PayloadTooLarge { path: String, limit: usize },

    /// A pipeline stage failed while handling a request.
    #[error("handler error on {method} {path}: {message}")]
    Handler {
        method: Method,
        path: String,
        message: String,
    },

    /// Request validation failed; maps field names to failure reasons.
    #[error("validation failed: {0}")]
    Validation(ValidationFailures),

    /// Binding or serving the listener failed.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Mapping from field name to failure reason, as produced by an external
/// validator. The core only transports it; it defines no rules of its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationFailures(pub BTreeMap<String, String>);

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field, replacing any earlier reason.
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.0.insert(field.into(), reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (field, reason)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {reason}")?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for ValidationFailures {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_names_the_package() {
        let err = Error::MissingDependency {
            name: "session".into(),
            package: "tower-sessions".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tower-sessions"));
        assert!(msg.contains("session"));
    }

    #[test]
    fn validation_failures_format_as_field_reason_pairs() {
        let failures: ValidationFailures =
            [("email", "must contain '@'"), ("age", "must be positive")]
                .into_iter()
                .collect();
        let msg = failures.to_string();
        // BTreeMap keeps fields sorted
        assert_eq!(msg, "age: must be positive; email: must contain '@'");
    }

    #[test]
    fn base_route_not_set_names_the_operation() {
        let err = Error::BaseRouteNotSet {
            operation: "registering POST handlers".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("POST"));
        assert!(msg.contains("route()"));
    }
}
