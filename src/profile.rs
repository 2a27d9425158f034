//! Credential profiles.
//!
//! A profile is plain `key=value` text, one pair per line:
//!
//! ```text
//! public_key=abcdefgh
//! private_key=00000000-0000-0000-0000-000000000000
//! project_id=5f1e...
//! spi_name=my-instance
//! api_host=cloud.mongodb.com
//! ```
//!
//! Lines that do not split into exactly two parts on `=` are ignored, as are
//! unknown keys. Keys and values are trimmed; a later line wins.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};

/// Credential and scope values read from a profile.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub project_id: Option<String>,
    pub instance_name: Option<String>,
    pub api_host: Option<String>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("project_id", &self.project_id)
            .field("instance_name", &self.instance_name)
            .field("api_host", &self.api_host)
            .finish()
    }
}

impl Profile {
    pub fn parse(text: &str) -> Self {
        let mut profile = Profile::default();
        for line in text.lines() {
            let parts: Vec<&str> = line.split('=').collect();
            let [key, value] = parts.as_slice() else {
                continue;
            };
            let value = Some(value.trim().to_string());
            match key.trim() {
                "public_key" => profile.public_key = value,
                "private_key" => profile.private_key = value,
                "project_id" => profile.project_id = value,
                "spi_name" => profile.instance_name = value,
                "api_host" => profile.api_host = value,
                _ => {}
            }
        }
        profile
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Credential fields in the shape the console endpoints expect.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        let fields = [
            ("public_key", &self.public_key),
            ("private_key", &self.private_key),
            ("project_id", &self.project_id),
            ("instance_name", &self.instance_name),
            ("atlas_host", &self.api_host),
        ];
        for (key, value) in fields {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                payload.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        payload
    }
}
