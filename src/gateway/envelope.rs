//! The single shape returned to the browser.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ConsoleError;

/// Message attached to bodiless upstream successes.
pub const ACK_MESSAGE: &str = "Action completed successfully.";

/// Outcome of one console action.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope {
    /// Upstream 2xx JSON, unmodified.
    Passthrough(Value),
    /// Upstream 2xx without a body.
    Acknowledged,
    Failure(Failure),
}

/// A structured error envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

/// Outbound request shape echoed on upstream HTTP errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl ResultEnvelope {
    pub fn status(&self) -> StatusCode {
        match self {
            ResultEnvelope::Passthrough(_) | ResultEnvelope::Acknowledged => StatusCode::OK,
            ResultEnvelope::Failure(failure) => failure.status,
        }
    }

    /// JSON body sent to the browser.
    pub fn into_body(self) -> Value {
        match self {
            ResultEnvelope::Passthrough(value) => value,
            ResultEnvelope::Acknowledged => json!({ "success": true, "message": ACK_MESSAGE }),
            ResultEnvelope::Failure(failure) => {
                serde_json::to_value(failure).unwrap_or_else(|_| json!({ "error": "serialization failure" }))
            }
        }
    }
}

impl From<ConsoleError> for ResultEnvelope {
    fn from(err: ConsoleError) -> Self {
        ResultEnvelope::Failure(Failure {
            status: err.status(),
            error: err.to_string(),
            details: err.details(),
            debug_info: None,
        })
    }
}
