//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trace_requests_total` (counter): requests by method, path, status
//! - `trace_request_duration_seconds` (histogram): latency distribution
//! - `trace_context_extractions_total` (counter): extraction outcome
//! - `trace_spans_started_total` (counter): server spans by kind (child, root)

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    metrics::counter!(
        "trace_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "trace_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// `outcome` is `"ok"` or an extraction error label.
pub fn record_extraction(outcome: &'static str) {
    metrics::counter!("trace_context_extractions_total", "outcome" => outcome).increment(1);
}

pub fn record_span_started(kind: &'static str) {
    metrics::counter!("trace_spans_started_total", "kind" => kind).increment(1);
}

/// Middleware recording request count and latency per matched route.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    // Label by route template so unknown paths don't explode cardinality.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    record_request(&method, &path, response.status().as_u16(), start);
    response
}
