//! Ground-transportation booking gateway library.
//!
//! Forwards search and reservation calls to the upstream booking API,
//! validating payloads first and wrapping every reply in a uniform envelope.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod security;
pub mod upstream;
pub mod validation;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::{Envelope, EnvelopeStatus, HttpServer};
pub use lifecycle::Shutdown;
