//! Request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) unless the caller sent one
//! - Open a tracing span per request carrying that ID
//! - Read JSON payloads, turning framework rejections into envelopes

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{HeaderName, HeaderValue, StatusCode},
};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::GatewayError;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

pub fn x_request_id() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Span for the tower-http trace layer.
pub fn make_request_span(request: &axum::http::Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// A request body parsed as arbitrary JSON.
///
/// Schema checks happen in the handler; this only guarantees well-formed JSON
/// within the configured size limit.
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Value);

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                GatewayError::PayloadTooLarge
            } else {
                GatewayError::MalformedBody(rejection.body_text())
            }
        })?;

        if bytes.is_empty() {
            return Err(GatewayError::MalformedBody("body is empty".to_string()));
        }

        serde_json::from_slice(&bytes)
            .map(JsonPayload)
            .map_err(|e| GatewayError::MalformedBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let request = axum::http::Request::new(());
        let mut maker = UuidRequestId;
        let id = maker.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());

        let other = maker.make_request_id(&request).unwrap();
        assert_ne!(id.header_value(), other.header_value());
    }

    #[tokio::test]
    async fn test_json_payload_accepts_any_json() {
        let req = Request::new(Body::from(r#"{"a":1}"#));
        let JsonPayload(value) = JsonPayload::from_request(req, &()).await.unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn test_json_payload_rejections() {
        let req = Request::new(Body::from("{not json"));
        let err = JsonPayload::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedBody(_)));
        assert_eq!(err.status_code(), StatusCode::OK);

        let req = Request::new(Body::empty());
        let err = JsonPayload::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedBody(_)));
    }
}
