//! Inbound action vocabulary: resources, operations and credentials.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource family managed through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Processor,
    Connection,
    StreamInstance,
}

impl Resource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Resource::Processor => "processor",
            Resource::Connection => "connection",
            Resource::StreamInstance => "stream_instance",
        }
    }

    /// Inbound field carrying the name of a sub-resource of this family.
    pub const fn name_field(self) -> &'static str {
        match self {
            Resource::Processor => "processor_name",
            Resource::Connection => "connection_name",
            Resource::StreamInstance => "instance_name",
        }
    }

    /// Inbound field carrying the JSON body for `create`.
    pub const fn body_field(self) -> &'static str {
        match self {
            Resource::Processor => "processor_body",
            Resource::Connection => "connection_body",
            Resource::StreamInstance => "spi_body",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processor" | "processors" => Ok(Resource::Processor),
            "connection" | "connections" => Ok(Resource::Connection),
            "stream_instance" | "instance" | "instances" | "spi" => Ok(Resource::StreamInstance),
            _ => Err(()),
        }
    }
}

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Get,
    Create,
    Start,
    Stop,
    Delete,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Operation::List),
            // The console labels the processor detail view "stats".
            "get" | "stats" => Ok(Operation::Get),
            "create" => Ok(Operation::Create),
            "start" => Ok(Operation::Start),
            "stop" => Ok(Operation::Stop),
            "delete" => Ok(Operation::Delete),
            _ => Err(()),
        }
    }
}

/// API credentials and project scope supplied with every request.
///
/// Never persisted; lives for the duration of one inbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub public_key: String,
    pub private_key: String,
    pub project_id: String,
    pub instance_name: Option<String>,
    pub api_host: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("instance_name", &self.instance_name)
            .field("api_host", &self.api_host)
            .finish()
    }
}

/// A single action requested by the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub resource: Resource,
    pub operation: Operation,
    /// Name of the processor or connection the action targets.
    pub resource_name: Option<String>,
    /// JSON object sent upstream on `create`.
    pub body: Option<Value>,
}

impl ActionRequest {
    pub fn new(resource: Resource, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            resource_name: None,
            body: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
