//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the console.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the console server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream management API settings.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Settings for calls to the stream-processing management API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host used when a request does not name one.
    pub default_host: String,

    /// URL scheme for upstream calls.
    pub scheme: String,

    /// Path prefix in front of `/groups/{project}`.
    pub base_path: String,

    /// Total time allowed for one upstream exchange, in seconds.
    pub timeout_secs: u64,

    /// Echo the digest `Authorization` header verbatim in error debug info.
    /// When false the value is replaced with a redaction marker.
    pub expose_auth_header: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            default_host: "cloud.mongodb.com".to_string(),
            scheme: "https".to_string(),
            base_path: "/api/atlas/v2".to_string(),
            timeout_secs: 30,
            expose_auth_header: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ConsoleConfig = toml::from_str("[upstream]\ntimeout_secs = 10\n").unwrap();
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.upstream.default_host, "cloud.mongodb.com");
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert!(!config.upstream.expose_auth_header);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_tls_and_json_logs() {
        let raw = r#"
            [listener]
            bind_address = "127.0.0.1:8443"
            [listener.tls]
            cert_path = "cert.pem"
            key_path = "key.pem"
            [observability]
            log_format = "json"
        "#;
        let config: ConsoleConfig = toml::from_str(raw).unwrap();
        let tls = config.listener.tls.unwrap();
        assert_eq!(tls.cert_path, "cert.pem");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
