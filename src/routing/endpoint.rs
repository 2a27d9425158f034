//! Typed endpoint templates.
//!
//! # Responsibilities
//! - Describe upstream paths as fixed segments plus identifier slots
//! - Escape every identifier as exactly one path segment
//! - Validate the upstream host before a URL is built
//!
//! # Design Decisions
//! - Identifiers escape everything outside RFC 3986 unreserved characters,
//!   so `/`, `?`, `#` and `:` can never come from user input
//! - Action suffixes (`:start`) are template literals and stay unescaped
//! - Dot segments are rejected; URL parsing would otherwise collapse them

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::ConsoleError;

/// Media type for the processor API family.
pub const PROCESSORS_V1: &str = "application/vnd.atlas.2024-05-30+json";
/// Media type for the instance and connection API family.
pub const INSTANCES_V1: &str = "application/vnd.atlas.2023-02-01+json";
/// Plain JSON content type.
pub const JSON: &str = "application/json";

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Upstream API version, selected per resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    Processors,
    Instances,
}

impl ApiVersion {
    pub const fn media_type(self) -> &'static str {
        match self {
            ApiVersion::Processors => PROCESSORS_V1,
            ApiVersion::Instances => INSTANCES_V1,
        }
    }
}

/// One piece of an endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static str),
    /// The stream instance name.
    Instance,
    /// The processor or connection name.
    Name,
    /// The processor or connection name followed by a literal action suffix.
    NameWithSuffix(&'static str),
}

/// Identifier values available when rendering a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slots<'a> {
    pub instance: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// Path below `/groups/{project}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate(pub &'static [Segment]);

impl PathTemplate {
    pub fn needs_instance(&self) -> bool {
        self.0.iter().any(|s| matches!(s, Segment::Instance))
    }

    pub fn needs_name(&self) -> bool {
        self.0
            .iter()
            .any(|s| matches!(s, Segment::Name | Segment::NameWithSuffix(_)))
    }

    /// Render the template into an escaped path starting with `/`.
    ///
    /// `name_field` is reported when the name slot is empty.
    pub fn render(&self, slots: Slots<'_>, name_field: &'static str) -> Result<String, ConsoleError> {
        let mut path = String::new();
        for segment in self.0 {
            path.push('/');
            match *segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Instance => {
                    path.push_str(&escape_identifier("instance_name", slots.instance)?)
                }
                Segment::Name => path.push_str(&escape_identifier(name_field, slots.name)?),
                Segment::NameWithSuffix(suffix) => {
                    path.push_str(&escape_identifier(name_field, slots.name)?);
                    path.push_str(suffix);
                }
            }
        }
        Ok(path)
    }
}

/// Scheme and path prefix shared by every upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBase {
    pub scheme: String,
    pub base_path: String,
}

impl UpstreamBase {
    /// Build the full URL for a project-scoped template.
    pub fn url(
        &self,
        host: &str,
        project_id: &str,
        template: PathTemplate,
        slots: Slots<'_>,
        name_field: &'static str,
    ) -> Result<Url, ConsoleError> {
        if !is_valid_host(host) {
            return Err(ConsoleError::InvalidField {
                field: "atlas_host",
                reason: format!("'{}' is not a host name", host),
            });
        }
        let project = escape_identifier("project_id", Some(project_id))?;
        let path = template.render(slots, name_field)?;
        let raw = format!(
            "{}://{}{}/groups/{}{}",
            self.scheme, host, self.base_path, project, path
        );
        Url::parse(&raw).map_err(|e| ConsoleError::Internal(format!("invalid upstream URL: {}", e)))
    }
}

fn escape_identifier(field: &'static str, value: Option<&str>) -> Result<String, ConsoleError> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or(ConsoleError::MissingFields(vec![field]))?;
    if value == "." || value == ".." {
        return Err(ConsoleError::InvalidField {
            field,
            reason: "dot segments are not allowed".to_string(),
        });
    }
    Ok(utf8_percent_encode(value, SEGMENT).to_string())
}

/// Whether `host` is a bare `host[:port]` with nothing else attached.
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty()
        || host
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "/?#@\\".contains(c))
    {
        return false;
    }
    match Url::parse(&format!("https://{}", host)) {
        Ok(url) => url.host_str().is_some() && url.path() == "/",
        Err(_) => false,
    }
}
