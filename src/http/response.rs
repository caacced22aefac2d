//! Response envelope construction.
//!
//! # Responsibilities
//! - Wrap every outbound body in the `{status, message?, data?, errors?}` envelope
//! - Translate an upstream status into success or a reported failure
//! - Parse upstream bodies into `data`
//!
//! # Design Decisions
//! - An upstream status other than the expected one is reported inside the
//!   envelope with HTTP 200; the gateway itself did not fail
//! - Raw upstream bytes never reach the caller unwrapped

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::operation::Operation;
use crate::upstream::UpstreamResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// The uniform body of every gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: Some(message.into()),
            data,
            errors: None,
        }
    }

    pub fn error(errors: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: None,
            data: None,
            errors: Some(errors.into()),
        }
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

/// An envelope paired with the HTTP status it is sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl EnvelopeResponse {
    pub fn new(status: StatusCode, envelope: Envelope) -> Self {
        Self { status, envelope }
    }

    /// Metric label for how the request ended.
    pub fn outcome(&self) -> &'static str {
        if self.envelope.is_success() {
            "success"
        } else {
            "upstream_status"
        }
    }
}

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Build the reply for an upstream response to `operation`.
pub fn translate(operation: &Operation, response: UpstreamResponse) -> EnvelopeResponse {
    let data = parse_body(&response.body);

    if response.status == operation.expected {
        EnvelopeResponse::new(
            operation.expected,
            Envelope::success(operation.completed_message(), data),
        )
    } else {
        tracing::warn!(
            operation = operation.name,
            expected = operation.expected.as_u16(),
            actual = response.status.as_u16(),
            "Upstream returned unexpected status"
        );
        EnvelopeResponse::new(
            StatusCode::OK,
            Envelope::error(operation.unsuccessful_message()).with_data(data),
        )
    }
}

/// JSON bodies parse as-is; blank bodies give no data; anything else is kept as text.
pub fn parse_body(body: &Bytes) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::operation::{CREATE_SEARCH, DELETE_RESERVATION, POLL_SEARCH};
    use serde_json::json;

    fn upstream(status: u16, body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_success_envelope_serialization() {
        let reply = translate(&CREATE_SEARCH, upstream(201, r#"{"search_id":"abc"}"#));
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(
            serde_json::to_string(&reply.envelope).unwrap(),
            r#"{"status":"success","message":"api_search completed","data":{"search_id":"abc"}}"#
        );
        assert_eq!(reply.outcome(), "success");
    }

    #[test]
    fn test_mismatch_reports_inside_200() {
        let reply = translate(&POLL_SEARCH, upstream(404, r#"{"detail":"Not found."}"#));
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.envelope.status, EnvelopeStatus::Error);
        assert_eq!(reply.envelope.data, Some(json!({"detail": "Not found."})));
        assert_eq!(
            reply.envelope.errors.as_deref(),
            Some("api_search_poll external API returned unsuccessful response")
        );
        assert!(reply.envelope.message.is_none());
        assert_eq!(reply.outcome(), "upstream_status");
    }

    #[test]
    fn test_other_2xx_is_still_a_mismatch() {
        let reply = translate(&CREATE_SEARCH, upstream(200, "{}"));
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!reply.envelope.is_success());
    }

    #[test]
    fn test_delete_expects_202() {
        let reply = translate(&DELETE_RESERVATION, upstream(202, ""));
        assert_eq!(reply.status, StatusCode::ACCEPTED);
        assert!(reply.envelope.is_success());
        assert!(reply.envelope.data.is_none());
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")), None);
        assert_eq!(parse_body(&Bytes::from_static(b"[1,2]")), Some(json!([1, 2])));
        assert_eq!(
            parse_body(&Bytes::from_static(b"<html>bad gateway</html>")),
            Some(json!("<html>bad gateway</html>"))
        );
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let body = serde_json::to_string(&Envelope::error("invalid id")).unwrap();
        assert_eq!(body, r#"{"status":"error","errors":"invalid id"}"#);
    }
}
