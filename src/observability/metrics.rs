//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): finished requests by operation, outcome
//! - `gateway_upstream_calls_total` (counter): upstream round trips by method, outcome
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency by method
//! - `gateway_rate_limited_total` (counter): rejected requests by route scope
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One finished gateway request.
pub fn record_request(operation: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "gateway_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// One upstream round trip.
pub fn record_upstream_call(method: &str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!(
        "gateway_upstream_calls_total",
        "method" => method.to_owned(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_upstream_duration_seconds",
        "method" => method.to_owned()
    )
    .record(elapsed.as_secs_f64());
}

/// One request rejected by the rate limiter.
pub fn record_rate_limited(scope: &'static str) {
    ::metrics::counter!("gateway_rate_limited_total", "scope" => scope).increment(1);
}
