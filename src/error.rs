//! Request-level error taxonomy.
//!
//! Every variant renders as an error envelope; nothing here is fatal to the
//! process.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::{Envelope, EnvelopeResponse};
use crate::upstream::UpstreamError;
use crate::validation::ValidationError;

/// Message reported for an empty path identifier.
pub const INVALID_ID_MESSAGE: &str = "invalid id: identifier must not be empty";

/// Errors that end a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Payload failed its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Empty path identifier on a poll or delete route.
    #[error("{}", INVALID_ID_MESSAGE)]
    InvalidIdentifier,

    /// Body is not JSON at all.
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("request body is too large")]
    PayloadTooLarge,

    /// Upstream could not be reached or did not answer in time.
    #[error("{operation} external API call failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: UpstreamError,
    },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("no route for {0}")]
    NotFound(String),

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },
}

impl GatewayError {
    /// HTTP status the envelope is sent with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_)
            | GatewayError::InvalidIdentifier
            | GatewayError::MalformedBody(_) => StatusCode::OK,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream { source, .. } if source.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Metric label for how the request ended.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) | GatewayError::MalformedBody(_) | GatewayError::PayloadTooLarge => {
                "invalid_payload"
            }
            GatewayError::InvalidIdentifier => "invalid_id",
            GatewayError::Upstream { source, .. } if source.is_timeout() => "upstream_timeout",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::MethodNotAllowed { .. } => "method_not_allowed",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        EnvelopeResponse::new(self.status_code(), Envelope::error(self.to_string())).into_response()
    }
}
