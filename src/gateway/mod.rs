//! Upstream gateway subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedCall + Credentials
//!     → upstream.rs (send, answer Digest challenge, collect reply)
//!     → normalize.rs (success passthrough / ack / failure envelope)
//!     → ResultEnvelope
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream exchange per action; no retries, no breaker
//! - A single upstream deadline covers the digest handshake; hitting it is
//!   a transport failure
//! - Debug info never carries the private key; the digest header is
//!   redacted unless configured otherwise

pub mod digest;
pub mod envelope;
pub mod normalize;
pub mod upstream;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use envelope::{DebugInfo, Failure, ResultEnvelope};
pub use normalize::AuthHeader;
pub use upstream::{HttpUpstream, SentRequest, Upstream, UpstreamError, UpstreamReply};

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::routing::{Credentials, ResolvedCall};

/// Executes resolved calls and normalizes their outcome.
#[derive(Clone)]
pub struct Gateway {
    upstream: Arc<dyn Upstream>,
    auth_header: AuthHeader,
}

impl Gateway {
    pub fn new(upstream: Arc<dyn Upstream>, auth_header: AuthHeader) -> Self {
        Self { upstream, auth_header }
    }

    /// Gateway backed by a real HTTP client.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(Duration::from_secs(config.timeout_secs))?;
        let auth_header = if config.expose_auth_header {
            AuthHeader::Expose
        } else {
            AuthHeader::Redact
        };
        Ok(Self::new(Arc::new(upstream), auth_header))
    }

    /// Perform the call once and return the browser envelope.
    pub async fn execute(&self, call: &ResolvedCall, credentials: &Credentials, request_id: &str) -> ResultEnvelope {
        let start_time = Instant::now();
        tracing::debug!(
            request_id = %request_id,
            route = call.label,
            method = %call.method,
            url = %call.url,
            "Forwarding to upstream"
        );

        let result = self.upstream.send(call, credentials).await;
        let outcome = match &result {
            Ok(reply) if reply.status.is_success() => "success",
            Ok(_) => "upstream_error",
            Err(UpstreamError::Transport(_)) => "transport_error",
            Err(UpstreamError::Internal(_)) => "internal_error",
        };

        match &result {
            Ok(reply) => tracing::info!(
                request_id = %request_id,
                route = call.label,
                status = reply.status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Upstream responded"
            ),
            Err(e) => tracing::error!(
                request_id = %request_id,
                route = call.label,
                error = %e,
                outcome,
                "Upstream call failed"
            ),
        }

        let envelope = normalize::normalize(result, self.auth_header);
        metrics::record_upstream_call(call.label, outcome, envelope.status().as_u16(), start_time);
        envelope
    }
}
