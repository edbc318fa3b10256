//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check middleware names are non-empty and not duplicated
//! - Validate listener and logging values
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ServerConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "listener.host").
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError {
            field: "listener.host".into(),
            reason: "must not be empty".into(),
        });
    }

    if config.logging.level.trim().is_empty() {
        errors.push(ValidationError {
            field: "logging.level".into(),
            reason: "must not be empty".into(),
        });
    }

    for (i, entry) in config.middleware.iter().enumerate() {
        if entry.name.trim().is_empty() {
            errors.push(ValidationError {
                field: format!("middleware[{i}].name"),
                reason: "must not be empty".into(),
            });
        }
    }

    let mut seen = Vec::new();
    for (i, entry) in config.middleware.iter().enumerate() {
        if seen.contains(&entry.name.as_str()) {
            errors.push(ValidationError {
                field: format!("middleware[{i}].name"),
                reason: format!("'{}' declared more than once", entry.name),
            });
        } else {
            seen.push(entry.name.as_str());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
