//! Passthrough option objects for the middleware facility.
//!
//! Recognized keys are forwarded verbatim to the backing layer; this layer
//! defines no validation of its own beyond deserialization.

use serde::{Deserialize, Serialize};

/// Options forwarded to the CORS layer. `None` leaves the backing layer's
/// own default in place; `"*"` in a list means "any".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsOptions {
    /// Allowed origins; `"*"` for any.
    pub origins: Option<Vec<String>>,
    /// Allowed HTTP methods; `"*"` for any.
    pub methods: Option<Vec<String>>,
    /// Allowed request headers; `"*"` for any.
    pub allowed_headers: Option<Vec<String>>,
    /// Whether to allow credentials.
    pub credentials: Option<bool>,
    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

/// Options for the request body size limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyLimitOptions {
    /// Maximum request body size in bytes.
    pub max_bytes: usize,
}

impl Default for BodyLimitOptions {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
        }
    }
}

/// Options for the request timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutOptions {
    /// Whole-request timeout in seconds.
    pub secs: u64,
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self { secs: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_from_partial_tables() {
        let cors: CorsOptions = toml::from_str("origins = [\"https://example.com\"]\n")
            .expect("partial table deserializes");
        assert_eq!(cors.origins.as_deref(), Some(&["https://example.com".to_string()][..]));
        assert!(cors.methods.is_none());

        let limit: BodyLimitOptions = toml::from_str("").expect("empty table uses defaults");
        assert_eq!(limit.max_bytes, 1024 * 1024);

        let timeout: TimeoutOptions = toml::from_str("secs = 5\n").expect("deserializes");
        assert_eq!(timeout.secs, 5);
    }
}
