//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-caller, per-route token buckets)
//!     → route handler
//! ```
//!
//! # Design Decisions
//! - The limiter is an owned value injected into each route, not a global
//! - Rejected requests are answered immediately (429), never queued

pub mod rate_limit;

pub use rate_limit::{LimitPolicy, Rate, RateLimiter, RouteLimit};
