//! Action lookup and resolution.
//!
//! # Responsibilities
//! - Hold the table of supported (resource, operation) pairs
//! - Check required identifiers before anything touches the network
//! - Produce exactly one `ResolvedCall` per accepted request
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - Route table is plain data; resolution is a pure function
//! - Unknown pairs are an explicit "invalid action", never a default route

use std::fmt;

use axum::http::Method;
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ConsoleError;
use crate::routing::action::{ActionRequest, Credentials, Operation, Resource};
use crate::routing::endpoint::{ApiVersion, PathTemplate, Segment, Slots, UpstreamBase, JSON};

use crate::routing::endpoint::Segment::{Instance, Literal, Name, NameWithSuffix};

/// HTTP verb used upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Which content type a route sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    /// The versioned media type of the route's API family.
    Versioned,
}

/// One row of the route table.
#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub resource: Resource,
    pub operation: Operation,
    pub verb: Verb,
    pub path: PathTemplate,
    pub version: ApiVersion,
    pub content_type: ContentType,
    /// Static name used for logs and metrics.
    pub label: &'static str,
}

const fn route(
    resource: Resource,
    operation: Operation,
    verb: Verb,
    path: &'static [Segment],
    version: ApiVersion,
    label: &'static str,
) -> RouteSpec {
    RouteSpec {
        resource,
        operation,
        verb,
        path: PathTemplate(path),
        version,
        content_type: ContentType::Json,
        label,
    }
}

const PROCESSORS: &[Segment] = &[Literal("streams"), Instance, Literal("processors")];
const PROCESSOR: &[Segment] = &[Literal("streams"), Instance, Literal("processor")];
const PROCESSOR_NAMED: &[Segment] = &[Literal("streams"), Instance, Literal("processor"), Name];
const PROCESSOR_START: &[Segment] = &[
    Literal("streams"),
    Instance,
    Literal("processor"),
    NameWithSuffix(":start"),
];
const PROCESSOR_STOP: &[Segment] = &[
    Literal("streams"),
    Instance,
    Literal("processor"),
    NameWithSuffix(":stop"),
];
const STREAMS: &[Segment] = &[Literal("streams")];
const STREAM_NAMED: &[Segment] = &[Literal("streams"), Instance];
const CONNECTIONS: &[Segment] = &[Literal("streams"), Instance, Literal("connections")];
const CONNECTION_NAMED: &[Segment] = &[Literal("streams"), Instance, Literal("connections"), Name];

/// Every action the console can forward.
pub static ROUTES: &[RouteSpec] = &[
    route(
        Resource::Processor,
        Operation::List,
        Verb::Get,
        PROCESSORS,
        ApiVersion::Processors,
        "processor.list",
    ),
    route(
        Resource::Processor,
        Operation::Create,
        Verb::Post,
        PROCESSOR,
        ApiVersion::Processors,
        "processor.create",
    ),
    route(
        Resource::Processor,
        Operation::Get,
        Verb::Get,
        PROCESSOR_NAMED,
        ApiVersion::Processors,
        "processor.get",
    ),
    route(
        Resource::Processor,
        Operation::Start,
        Verb::Post,
        PROCESSOR_START,
        ApiVersion::Processors,
        "processor.start",
    ),
    route(
        Resource::Processor,
        Operation::Stop,
        Verb::Post,
        PROCESSOR_STOP,
        ApiVersion::Processors,
        "processor.stop",
    ),
    route(
        Resource::Processor,
        Operation::Delete,
        Verb::Delete,
        PROCESSOR_NAMED,
        ApiVersion::Processors,
        "processor.delete",
    ),
    route(
        Resource::StreamInstance,
        Operation::List,
        Verb::Get,
        STREAMS,
        ApiVersion::Instances,
        "stream_instance.list",
    ),
    route(
        Resource::StreamInstance,
        Operation::Create,
        Verb::Post,
        STREAMS,
        ApiVersion::Instances,
        "stream_instance.create",
    ),
    route(
        Resource::StreamInstance,
        Operation::Delete,
        Verb::Delete,
        STREAM_NAMED,
        ApiVersion::Instances,
        "stream_instance.delete",
    ),
    route(
        Resource::Connection,
        Operation::List,
        Verb::Get,
        CONNECTIONS,
        ApiVersion::Instances,
        "connection.list",
    ),
    RouteSpec {
        content_type: ContentType::Versioned,
        ..route(
            Resource::Connection,
            Operation::Create,
            Verb::Post,
            CONNECTIONS,
            ApiVersion::Instances,
            "connection.create",
        )
    },
    route(
        Resource::Connection,
        Operation::Get,
        Verb::Get,
        CONNECTION_NAMED,
        ApiVersion::Instances,
        "connection.get",
    ),
    route(
        Resource::Connection,
        Operation::Delete,
        Verb::Delete,
        CONNECTION_NAMED,
        ApiVersion::Instances,
        "connection.delete",
    ),
];

/// A fully resolved upstream request, not yet executed.
#[derive(Clone, PartialEq)]
pub struct ResolvedCall {
    pub label: &'static str,
    pub method: Method,
    pub url: Url,
    pub accept: &'static str,
    pub content_type: &'static str,
    pub body: Option<Value>,
}

impl fmt::Debug for ResolvedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCall")
            .field("label", &self.label)
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("accept", &self.accept)
            .field("content_type", &self.content_type)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Maps action requests to upstream calls.
#[derive(Debug, Clone)]
pub struct ActionRouter {
    base: UpstreamBase,
}

impl ActionRouter {
    pub fn new(base: UpstreamBase) -> Self {
        Self { base }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(UpstreamBase {
            scheme: config.scheme.clone(),
            base_path: config.base_path.clone(),
        })
    }

    /// Look up the route for a (resource, operation) pair.
    pub fn route_for(resource: Resource, operation: Operation) -> Option<&'static RouteSpec> {
        ROUTES
            .iter()
            .find(|r| r.resource == resource && r.operation == operation)
    }

    /// Names of the inbound fields the request still lacks.
    pub fn missing_fields(route: &RouteSpec, request: &ActionRequest, credentials: &Credentials) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if route.path.needs_instance() && is_blank(credentials.instance_name.as_deref()) {
            missing.push("instance_name");
        }
        if route.path.needs_name() && is_blank(request.resource_name.as_deref()) {
            missing.push(route.resource.name_field());
        }
        if route.operation == Operation::Create && is_empty_body(request.body.as_ref()) {
            missing.push(route.resource.body_field());
        }
        missing
    }

    /// Resolve a request into the single upstream call it maps to.
    pub fn resolve(&self, request: &ActionRequest, credentials: &Credentials) -> Result<ResolvedCall, ConsoleError> {
        let route = Self::route_for(request.resource, request.operation).ok_or_else(|| {
            ConsoleError::InvalidAction {
                resource: request.resource,
                action: request.operation.as_str().to_string(),
            }
        })?;

        let missing = Self::missing_fields(route, request, credentials);
        if !missing.is_empty() {
            return Err(ConsoleError::MissingFields(missing));
        }

        let body = if route.operation == Operation::Create {
            match &request.body {
                Some(body @ Value::Object(_)) => Some(body.clone()),
                _ => {
                    return Err(ConsoleError::InvalidField {
                        field: route.resource.body_field(),
                        reason: "expected a JSON object".to_string(),
                    })
                }
            }
        } else {
            None
        };

        let slots = Slots {
            instance: credentials.instance_name.as_deref(),
            name: request.resource_name.as_deref(),
        };
        let url = self.base.url(
            &credentials.api_host,
            &credentials.project_id,
            route.path,
            slots,
            route.resource.name_field(),
        )?;

        let accept = route.version.media_type();
        let content_type = match route.content_type {
            ContentType::Json => JSON,
            ContentType::Versioned => accept,
        };

        Ok(ResolvedCall {
            label: route.label,
            method: route.verb.method(),
            url,
            accept,
            content_type,
            body,
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// Absent, `null` and `{}` bodies all count as missing.
fn is_empty_body(body: Option<&Value>) -> bool {
    match body {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}
