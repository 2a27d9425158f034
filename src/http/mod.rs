//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware: request id, trace, limits, timeout)
//!     → handlers.rs (endpoint → resource/operation)
//!     → payload.rs (JSON object, credentials, identifiers)
//!     → routing (resolve) → gateway (execute, normalize)
//!     → response.rs (envelope → status + JSON)
//! ```

pub mod handlers;
pub mod payload;
pub mod response;
pub mod server;

pub use handlers::{InboundRoute, INBOUND_ROUTES};
pub use server::{AppState, ConsoleServer};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";
