//! Upstream error definitions.

use thiserror::Error;

/// Errors that prevent an upstream call from producing a response.
///
/// A response with an unexpected status is not an error at this level; the
/// caller decides what status it expected.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No complete response within the configured deadline.
    #[error("upstream did not respond within {0} seconds")]
    Timeout(u64),

    /// Connection refused, DNS failure, reset, unreadable body.
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Base URL cannot take path segments.
    #[error("cannot build upstream URL from '{0}'")]
    InvalidEndpoint(String),

    /// API key header name or value is not representable.
    #[error("invalid API key header: {0}")]
    InvalidHeader(String),

    /// reqwest refused the client configuration.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_))
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
