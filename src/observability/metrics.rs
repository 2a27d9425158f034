//! Metrics collection and exposition.
//!
//! # Metrics
//! - `console_upstream_requests_total` (counter): upstream calls by route, outcome, status
//! - `console_upstream_duration_seconds` (histogram): upstream latency by route
//! - `console_rejected_requests_total` (counter): inbound requests refused before any upstream call

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape listener and install it as the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// One completed upstream exchange.
pub fn record_upstream_call(route: &'static str, outcome: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "console_upstream_requests_total",
        "route" => route,
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("console_upstream_duration_seconds", "route" => route)
        .record(started.elapsed().as_secs_f64());
}

/// An inbound request refused during validation.
pub fn record_rejected(reason: &'static str) {
    metrics::counter!("console_rejected_requests_total", "reason" => reason).increment(1);
}
