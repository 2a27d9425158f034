//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.tls (config or TLS_CERT_PATH / TLS_KEY_PATH)
//!     → tls.rs (both files present? load PEM pair)
//!     → http::server (run_tls) or plain TCP fallback
//! ```

pub mod tls;

pub use tls::{load_tls_config, tls_files_present, TlsError};
