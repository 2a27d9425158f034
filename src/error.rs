//! Console error taxonomy.
//!
//! Input problems are caught before any upstream call and map to 400, except
//! an oversized body, which keeps 413.
//! Transport and internal failures map to 500. Upstream rejections are not
//! errors here; they are normalized straight into a failure envelope.

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::routing::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Invalid request format. Expected JSON.")]
    InvalidJson,

    #[error("Missing required fields.")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid action specified.")]
    InvalidAction { resource: Resource, action: String },

    #[error("Invalid value for '{field}'.")]
    InvalidField { field: &'static str, reason: String },

    #[error("Request body too large.")]
    BodyTooLarge { limit: usize },

    #[error("A network error occurred.")]
    Transport(String),

    #[error("An unexpected server error occurred.")]
    Internal(String),
}

impl ConsoleError {
    pub fn status(&self) -> StatusCode {
        match self {
            ConsoleError::InvalidJson
            | ConsoleError::MissingFields(_)
            | ConsoleError::InvalidAction { .. }
            | ConsoleError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            ConsoleError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConsoleError::Transport(_) | ConsoleError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Field-level detail for the envelope's `details` key.
    pub fn details(&self) -> Option<Value> {
        match self {
            ConsoleError::InvalidJson => None,
            ConsoleError::MissingFields(fields) => Some(json!({ "missing": fields })),
            ConsoleError::InvalidAction { resource, action } => Some(Value::String(format!(
                "'{}' is not a recognized action for {}",
                action, resource
            ))),
            ConsoleError::InvalidField { field, reason } => Some(json!({ "field": field, "reason": reason })),
            ConsoleError::BodyTooLarge { limit } => Some(json!({ "limit": limit })),
            ConsoleError::Transport(message) | ConsoleError::Internal(message) => {
                Some(Value::String(message.clone()))
            }
        }
    }

    /// Short reason used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleError::InvalidJson => "invalid_json",
            ConsoleError::MissingFields(_) => "missing_fields",
            ConsoleError::InvalidAction { .. } => "invalid_action",
            ConsoleError::InvalidField { .. } => "invalid_field",
            ConsoleError::BodyTooLarge { .. } => "body_too_large",
            ConsoleError::Transport(_) => "transport",
            ConsoleError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_bad_requests() {
        assert_eq!(ConsoleError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ConsoleError::MissingFields(vec!["instance_name"]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ConsoleError::Transport("refused".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_oversized_body_keeps_413() {
        let err = ConsoleError::BodyTooLarge { limit: 1024 };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.details(), Some(json!({"limit": 1024})));
    }

    #[test]
    fn test_missing_fields_details_list_names() {
        let err = ConsoleError::MissingFields(vec!["instance_name", "processor_name"]);
        assert_eq!(
            err.details(),
            Some(json!({"missing": ["instance_name", "processor_name"]}))
        );
    }

    #[test]
    fn test_invalid_action_message() {
        let err = ConsoleError::InvalidAction {
            resource: Resource::Connection,
            action: "start".into(),
        };
        assert!(err.to_string().to_lowercase().contains("invalid action"));
        assert_eq!(
            err.details(),
            Some(Value::String("'start' is not a recognized action for connection".into()))
        );
    }
}
