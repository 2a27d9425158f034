//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + .env / process environment
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ConsoleConfig (validated, immutable)
//!     → passed by value into the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Per-request values (credentials, upstream host) never live here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, parse_config, ConfigError};
pub use schema::ConsoleConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::TlsConfig;
pub use schema::UpstreamConfig;
