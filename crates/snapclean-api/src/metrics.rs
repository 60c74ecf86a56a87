//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "snapclean_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "snapclean_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "snapclean_http_requests_in_flight";

    // Editing metrics
    pub const DETECTIONS_TOTAL: &str = "snapclean_detections_total";
    pub const PEOPLE_DETECTED: &str = "snapclean_people_detected";
    pub const REMOVALS_TOTAL: &str = "snapclean_removals_total";
    pub const PEOPLE_REMOVED: &str = "snapclean_people_removed";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a detection answer.
pub fn record_detection(mode: &str, people: usize) {
    let labels = [("mode", mode.to_string())];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);
    histogram!(names::PEOPLE_DETECTED, &labels).record(people as f64);
}

/// Record a removal answer.
pub fn record_removal(mode: &str, people: usize) {
    let labels = [("mode", mode.to_string())];
    counter!(names::REMOVALS_TOTAL, &labels).increment(1);
    histogram!(names::PEOPLE_REMOVED, &labels).record(people as f64);
}

/// Map a request path to a bounded label value.
fn sanitize_path(path: &str) -> &'static str {
    match path.trim_end_matches('/') {
        "/api/detect" => "/api/detect",
        "/api/process" => "/api/process",
        "/health" => "/health",
        "/healthz" => "/healthz",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "unmatched",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
