//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber (HTTP or HTTPS server) stops accepting and drains
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
