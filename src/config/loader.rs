//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ConsoleConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the TLS certificate (PEM).
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
/// Environment variable naming the TLS private key (PEM).
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
/// Environment variable overriding `listener.bind_address`.
pub const BIND_ADDRESS_ENV: &str = "CONSOLE_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ConsoleConfig, ConfigError> {
    let config: ConsoleConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply overrides from the process environment.
///
/// `TLS_CERT_PATH` and `TLS_KEY_PATH` only take effect as a pair.
pub fn apply_env_overrides(config: &mut ConsoleConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut ConsoleConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = non_empty(BIND_ADDRESS_ENV) {
        config.listener.bind_address = addr;
    }

    if let (Some(cert_path), Some(key_path)) = (non_empty(TLS_CERT_ENV), non_empty(TLS_KEY_ENV)) {
        config.listener.tls = Some(TlsConfig { cert_path, key_path });
    }
}
