//! Upstream booking API access.
//!
//! # Data Flow
//! ```text
//! handler pipeline
//!     → client.rs call(method, segments, body)
//!         → one reqwest round trip under a tokio deadline
//!     → UpstreamResponse { status, body } or UpstreamError
//! ```
//!
//! # Design Decisions
//! - Exactly one network call per invocation, no retries
//! - Timeouts are distinct from other transport failures
//! - Non-2xx statuses are responses, not errors

pub mod client;
pub mod error;

pub use client::{UpstreamClient, UpstreamResponse};
pub use error::{UpstreamError, UpstreamResult};
