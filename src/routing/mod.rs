//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ActionRequest (resource, operation, name, body) + Credentials
//!     → router.rs (route table lookup, required-field gate)
//!     → endpoint.rs (typed path template, escaped identifiers)
//!     → Return: ResolvedCall or ConsoleError (no network activity)
//! ```
//!
//! # Design Decisions
//! - Route table is static data, checked by a table-driven test
//! - Each resource family carries its own upstream API version
//! - Deterministic: same input always resolves to the same call

pub mod action;
pub mod endpoint;
pub mod router;

pub use action::{ActionRequest, Credentials, Operation, Resource};
pub use endpoint::{ApiVersion, UpstreamBase};
pub use router::{ActionRouter, ResolvedCall, RouteSpec, ROUTES};
