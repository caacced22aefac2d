//! HTTP client for the booking API.
//!
//! # Responsibilities
//! - Attach the API key and JSON content type to every call
//! - Build endpoint URLs from path segments (ids are percent-encoded)
//! - Enforce one bounded deadline per call
//! - Surface transport failures and timeouts as distinct errors

use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::time::timeout;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::error::{UpstreamError, UpstreamResult};

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Client for the upstream booking API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Url,
    timeout_duration: Duration,
}

impl UpstreamClient {
    /// Create a client from configuration.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| UpstreamError::InvalidEndpoint(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidEndpoint(config.base_url.clone()));
        }

        let header_name = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| UpstreamError::InvalidHeader(e.to_string()))?;
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| UpstreamError::InvalidHeader(e.to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header_name, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("ride-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::ClientBuild)?;

        Ok(Self {
            client,
            base_url,
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Absolute URL for `segments`, always with a trailing slash.
    pub fn endpoint(&self, segments: &[&str]) -> UpstreamResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidEndpoint(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments).push("");
        }
        Ok(url)
    }

    /// Issue exactly one request and return whatever status came back.
    pub async fn call(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> UpstreamResult<UpstreamResponse> {
        let url = self.endpoint(segments)?;
        let start = Instant::now();

        tracing::debug!(method = %method, url = %url, "Calling upstream");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        };

        let result = match timeout(self.timeout_duration, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(UpstreamError::Timeout(self.timeout_duration.as_secs())),
            Ok(Err(e)) => Err(UpstreamError::Transport(e)),
            Err(_) => Err(UpstreamError::Timeout(self.timeout_duration.as_secs())),
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(response) => {
                tracing::info!(
                    method = %method,
                    path = %url.path(),
                    status = response.status.as_u16(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Upstream responded"
                );
                metrics::record_upstream_call(method.as_str(), "response", elapsed);
            }
            Err(e) => {
                tracing::error!(
                    method = %method,
                    path = %url.path(),
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Upstream call failed"
                );
                let outcome = if e.is_timeout() { "timeout" } else { "transport_error" };
                metrics::record_upstream_call(method.as_str(), outcome, elapsed);
            }
        }

        result
    }
}
