//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a breeze
//! application. All types derive Serde traits for deserialization from
//! config files, and every field has a default so minimal configs work.

use serde::{Deserialize, Serialize};

use crate::app::ListenOptions;

/// Root configuration for an application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, startup message).
    pub listener: ListenerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Cross-cutting middleware, applied in declaration order.
    pub middleware: Vec<MiddlewareEntry>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g. "0.0.0.0").
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Startup message; defaults to one naming the bound port.
    pub startup_message: Option<String>,

    /// Whether to log the startup message.
    pub log_startup: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            startup_message: None,
            log_startup: true,
        }
    }
}

impl From<&ListenerConfig> for ListenOptions {
    fn from(config: &ListenerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            message: config.startup_message.clone(),
            log_startup: config.log_startup,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "breeze=debug").
    pub level: String,

    /// Emit JSON instead of human-readable lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// One declarative middleware registration: a name resolved by the
/// facility plus options passed through verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MiddlewareEntry {
    /// Facility name (e.g. "cors", "timeout").
    pub name: String,

    /// Passthrough options for the backing layer.
    #[serde(default)]
    pub options: toml::Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").expect("empty config is valid");
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert!(config.listener.log_startup);
        assert_eq!(config.logging.level, "info");
        assert!(config.middleware.is_empty());
    }

    #[test]
    fn middleware_entries_carry_passthrough_options() {
        let config: ServerConfig = toml::from_str(
            r#"
            [[middleware]]
            name = "timeout"
            options = { secs = 5 }

            [[middleware]]
            name = "trace"
            "#,
        )
        .expect("config parses");
        assert_eq!(config.middleware.len(), 2);
        assert_eq!(config.middleware[0].name, "timeout");
        assert_eq!(
            config.middleware[0].options.get("secs"),
            Some(&toml::Value::Integer(5))
        );
        assert!(config.middleware[1].options.is_empty());
    }

    #[test]
    fn listener_config_converts_to_listen_options() {
        let listener = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            startup_message: Some("up".into()),
            log_startup: false,
        };
        let opts = ListenOptions::from(&listener);
        assert_eq!(opts.port, 8080);
        assert_eq!(opts.host, "127.0.0.1");
        assert_eq!(opts.message.as_deref(), Some("up"));
        assert!(!opts.log_startup);
    }
}
