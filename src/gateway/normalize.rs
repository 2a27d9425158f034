//! Upstream result normalization.
//!
//! Three disjoint failure categories:
//! - upstream HTTP error: status verbatim, parsed body, outbound request shape
//! - transport failure: 500, network marker, no request shape
//! - internal failure: 500, generic marker
//!
//! A 2xx is never swallowed: it becomes passthrough JSON or an acknowledgment.

use std::collections::BTreeMap;

use axum::http::{header, StatusCode};
use serde_json::Value;

use crate::error::ConsoleError;
use crate::gateway::envelope::{DebugInfo, Failure, ResultEnvelope};
use crate::gateway::upstream::{SentRequest, UpstreamError, UpstreamReply};

/// Placeholder for the digest header value in debug info.
pub const REDACTED: &str = "[REDACTED]";

/// How the `Authorization` header appears in debug info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthHeader {
    #[default]
    Redact,
    Expose,
}

/// Turn one upstream exchange into the browser envelope.
pub fn normalize(result: Result<UpstreamReply, UpstreamError>, auth: AuthHeader) -> ResultEnvelope {
    let reply = match result {
        Ok(reply) => reply,
        Err(UpstreamError::Transport(message)) => return ConsoleError::Transport(message).into(),
        Err(UpstreamError::Internal(message)) => return ConsoleError::Internal(message).into(),
    };

    if reply.status.is_success() {
        return normalize_success(reply);
    }

    ResultEnvelope::Failure(Failure {
        status: reply.status,
        error: format!(
            "HTTP Error: {} {}",
            reply.status.as_u16(),
            reply.status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string(),
        details: Some(parse_details(&reply.body)),
        debug_info: Some(debug_info(&reply.sent, auth)),
    })
}

fn normalize_success(reply: UpstreamReply) -> ResultEnvelope {
    if reply.status == StatusCode::NO_CONTENT || reply.body.iter().all(u8::is_ascii_whitespace) {
        return ResultEnvelope::Acknowledged;
    }
    match serde_json::from_slice::<Value>(&reply.body) {
        Ok(value) => ResultEnvelope::Passthrough(value),
        Err(e) => ConsoleError::Internal(format!("upstream returned {} with a non-JSON body: {}", reply.status, e)).into(),
    }
}

/// Parsed JSON when possible, raw text otherwise.
fn parse_details(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn debug_info(sent: &SentRequest, auth: AuthHeader) -> DebugInfo {
    let mut headers = BTreeMap::new();
    for (name, value) in &sent.headers {
        let rendered = if *name == header::AUTHORIZATION && auth == AuthHeader::Redact {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        headers.insert(display_name(name.as_str()), rendered);
    }
    DebugInfo {
        method: sent.method.to_string(),
        url: sent.url.to_string(),
        headers,
    }
}

/// `content-type` → `Content-Type`.
fn display_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
