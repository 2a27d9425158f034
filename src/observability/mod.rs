//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + gateway produce:
//!     → logging.rs (structured log events, request id on every line)
//!     → metrics.rs (upstream counters and latency, rejected input)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Credentials never reach a log field or a metric label
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
