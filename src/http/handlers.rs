//! Route handlers.
//!
//! Each handler is one pass: guard input → call upstream once → translate
//! the status → envelope. Nothing is kept between requests.

use axum::{
    extract::{Path, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::GatewayError;
use crate::http::operation::{
    Operation, CREATE_RESERVATION, CREATE_SEARCH, DELETE_RESERVATION, POLL_RESERVATION,
    POLL_SEARCH,
};
use crate::http::request::JsonPayload;
use crate::http::response::{translate, EnvelopeResponse};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::validation::{validate, CompiledSchema};

type Outcome = Result<EnvelopeResponse, GatewayError>;

/// `POST /search/`
pub async fn create_search(
    State(state): State<AppState>,
    payload: Result<JsonPayload, GatewayError>,
) -> Response {
    let result = create(&state, &CREATE_SEARCH, &state.schemas.search, payload, "search").await;
    finish(&CREATE_SEARCH, result)
}

/// `GET /search/{search_id}/poll/`
pub async fn poll_search(
    State(state): State<AppState>,
    Path(search_id): Path<String>,
) -> Response {
    let result = by_id(&state, &POLL_SEARCH, "search", &search_id, Some("poll")).await;
    finish(&POLL_SEARCH, result)
}

/// `GET /search//poll/`
pub async fn poll_search_without_id(State(state): State<AppState>) -> Response {
    poll_search(State(state), Path(String::new())).await
}

/// `POST /reservations/`
pub async fn create_reservation(
    State(state): State<AppState>,
    payload: Result<JsonPayload, GatewayError>,
) -> Response {
    let result = create(
        &state,
        &CREATE_RESERVATION,
        &state.schemas.reservation,
        payload,
        "reservations",
    )
    .await;
    finish(&CREATE_RESERVATION, result)
}

/// `GET /reservations/{search_id}/poll/`
pub async fn poll_reservation(
    State(state): State<AppState>,
    Path(search_id): Path<String>,
) -> Response {
    let result = by_id(&state, &POLL_RESERVATION, "reservations", &search_id, Some("poll")).await;
    finish(&POLL_RESERVATION, result)
}

/// `GET /reservations//poll/`
pub async fn poll_reservation_without_id(State(state): State<AppState>) -> Response {
    poll_reservation(State(state), Path(String::new())).await
}

/// `DELETE /reservations/{reservation_id}/`
pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Response {
    let result = by_id(&state, &DELETE_RESERVATION, "reservations", &reservation_id, None).await;
    finish(&DELETE_RESERVATION, result)
}

/// `DELETE /reservations//`
pub async fn delete_reservation_without_id(State(state): State<AppState>) -> Response {
    delete_reservation(State(state), Path(String::new())).await
}

/// Any path no route claims.
pub async fn not_found(uri: Uri) -> GatewayError {
    GatewayError::NotFound(uri.path().to_string())
}

/// A known path called with a method it does not serve.
pub async fn method_not_allowed(method: Method, uri: Uri) -> GatewayError {
    GatewayError::MethodNotAllowed {
        method,
        path: uri.path().to_string(),
    }
}

async fn create(
    state: &AppState,
    operation: &Operation,
    schema: &CompiledSchema,
    payload: Result<JsonPayload, GatewayError>,
    collection: &str,
) -> Outcome {
    let JsonPayload(payload) = payload?;
    validate(&payload, schema)?;
    forward(state, operation, &[collection], Some(&payload)).await
}

async fn by_id(
    state: &AppState,
    operation: &Operation,
    collection: &str,
    id: &str,
    action: Option<&str>,
) -> Outcome {
    let id = require_id(id)?;
    match action {
        Some(action) => forward(state, operation, &[collection, id, action], None).await,
        None => forward(state, operation, &[collection, id], None).await,
    }
}

fn require_id(id: &str) -> Result<&str, GatewayError> {
    if id.trim().is_empty() {
        Err(GatewayError::InvalidIdentifier)
    } else {
        Ok(id)
    }
}

async fn forward(
    state: &AppState,
    operation: &Operation,
    segments: &[&str],
    body: Option<&Value>,
) -> Outcome {
    let response = state
        .upstream
        .call(operation.method.clone(), segments, body)
        .await
        .map_err(|source| GatewayError::Upstream {
            operation: operation.name,
            source,
        })?;
    Ok(translate(operation, response))
}

fn finish(operation: &Operation, result: Outcome) -> Response {
    match result {
        Ok(reply) => {
            metrics::record_request(operation.name, reply.outcome());
            reply.into_response()
        }
        Err(err) => {
            tracing::warn!(operation = operation.name, error = %err, "Request rejected");
            metrics::record_request(operation.name, err.outcome());
            err.into_response()
        }
    }
}
