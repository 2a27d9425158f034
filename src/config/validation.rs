//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Validate the upstream host and path prefix shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConsoleConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ConsoleConfig;
use crate::routing::endpoint::is_valid_host;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),

    #[error("upstream.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("upstream.scheme '{0}' must be http or https")]
    Scheme(String),

    #[error("upstream.default_host '{0}' is not a bare host name")]
    DefaultHost(String),

    #[error("upstream.base_path '{0}' must start with '/' and not end with '/'")]
    BasePath(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    let upstream = &config.upstream;
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if upstream.scheme != "https" && upstream.scheme != "http" {
        errors.push(ValidationError::Scheme(upstream.scheme.clone()));
    }
    if !is_valid_host(&upstream.default_host) {
        errors.push(ValidationError::DefaultHost(upstream.default_host.clone()));
    }
    // An empty prefix is allowed for upstreams mounted at the root.
    if !upstream.base_path.is_empty()
        && (!upstream.base_path.starts_with('/') || upstream.base_path.ends_with('/'))
    {
        errors.push(ValidationError::BasePath(upstream.base_path.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
