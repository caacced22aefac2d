//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, body limit)
//!     → security::rate_limit (per-route policy)
//!     → handlers.rs (guard → upstream call → translate)
//!         ← request.rs (JSON payload extraction)
//!         ← operation.rs (name, method, expected status)
//!     → response.rs (envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod operation;
pub mod request;
pub mod response;
pub mod server;

pub use request::{JsonPayload, X_REQUEST_ID};
pub use response::{Envelope, EnvelopeResponse, EnvelopeStatus};
pub use server::{AppState, HttpServer, ServerError};
