//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::BodyExt;
use ride_gateway::{Envelope, GatewayConfig, HttpServer};
use serde_json::Value;
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key";

/// One request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

/// Calls received by a mock upstream, in arrival order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn push(&self, call: RecordedCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` sees each recorded call and returns the status and body to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, CallLog)
where
    F: Fn(RecordedCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = CallLog::default();
    let f = Arc::new(f);

    let recorder = log.clone();
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let f = f.clone();
            let log = recorder.clone();
            async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let call = RecordedCall {
                    method,
                    path: uri.path().to_string(),
                    api_key: header("api-key"),
                    content_type: header("content-type"),
                    body: serde_json::from_slice(&body).ok(),
                };
                log.push(call.clone());
                let (status, body) = f(call).await;
                (StatusCode::from_u16(status).unwrap(), body).into_response()
            }
        },
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, log)
}

/// Mock upstream answering every call with the same status and body.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, CallLog) {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway settings pointing at `upstream`, rate limiting off.
pub fn gateway_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("http://{upstream}/v2");
    config.upstream.api_key = API_KEY.to_string();
    config.rate_limit.enabled = false;
    config
}

/// In-process gateway router with a fixed peer address.
pub fn gateway(config: GatewayConfig) -> Router {
    HttpServer::new(config)
        .unwrap()
        .router()
        .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 40000))))
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.to_string())
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_envelope(response: Response) -> Envelope {
    serde_json::from_value(body_json(response).await).unwrap()
}

pub fn search_payload() -> Value {
    serde_json::json!({
        "start_address": "A",
        "end_address": "B",
        "mode": "one_way",
        "pickup_datetime": "2023-12-01 15:30",
        "num_passengers": 2,
        "currency": "USD"
    })
}

pub fn reservation_payload() -> Value {
    serde_json::json!({
        "search_id": "abc",
        "result_id": "r-1",
        "email": "testingemail@gmail.com",
        "phone_number": "+37122345678",
        "first_name": "Ann",
        "last_name": "Lee",
        "airline": "AA",
        "flight_number": "123"
    })
}
