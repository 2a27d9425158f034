//! Inbound JSON payloads.
//!
//! Every console endpoint takes one JSON object. Absent keys, `null` and
//! empty strings are all treated as "not supplied".

use serde_json::{Map, Value};

use crate::error::ConsoleError;
use crate::routing::Credentials;

/// Credential fields every request must carry.
const CREDENTIAL_FIELDS: [&str; 3] = ["public_key", "private_key", "project_id"];

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound(Map<String, Value>);

impl Inbound {
    /// Decode a request body; anything but a JSON object is rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, ConsoleError> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) if !map.is_empty() => Ok(Self(map)),
            _ => Err(ConsoleError::InvalidJson),
        }
    }

    /// Non-empty string value of `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// First non-empty string among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Raw JSON value of `key`, if present and not `null`.
    pub fn body(&self, key: &str) -> Option<Value> {
        self.0.get(key).filter(|v| !v.is_null()).cloned()
    }

    /// Credential fields that are absent.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        CREDENTIAL_FIELDS
            .into_iter()
            .filter(|field| self.text(field).is_none())
            .collect()
    }

    /// Credentials carried by the payload.
    ///
    /// Fails with the full list of absent credential fields. The host falls
    /// back to `default_host`; it is validated when the URL is built.
    pub fn credentials(&self, default_host: &str) -> Result<Credentials, ConsoleError> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            return Err(ConsoleError::MissingFields(missing));
        }
        Ok(Credentials {
            public_key: self.text("public_key").unwrap_or_default(),
            private_key: self.text("private_key").unwrap_or_default(),
            project_id: self.text("project_id").unwrap_or_default(),
            instance_name: self.text("instance_name"),
            api_host: self
                .first_text(&["atlas_host", "api_host"])
                .unwrap_or_else(|| default_host.to_string()),
        })
    }
}
