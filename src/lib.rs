//! Stream Processing Console Library

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod profile;
pub mod routing;

pub use config::schema::ConsoleConfig;
pub use error::ConsoleError;
pub use gateway::{Gateway, ResultEnvelope};
pub use http::ConsoleServer;
pub use lifecycle::Shutdown;
pub use routing::{ActionRequest, ActionRouter, Credentials, Operation, Resource};
