//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "agri_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "agri_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "agri_http_requests_in_flight";

    // Prediction metrics
    pub const INFERENCE_DURATION_SECONDS: &str = "agri_inference_duration_seconds";
    pub const PREDICTIONS_TOTAL: &str = "agri_predictions_total";
    pub const SOIL_CONDITIONS_TOTAL: &str = "agri_soil_conditions_total";
}

/// Routes reported with their own label; anything else is grouped.
const KNOWN_PATHS: &[&str] = &[
    "/",
    "/predict_crop_health",
    "/predict_pest",
    "/predict_soil",
    "/health",
    "/healthz",
    "/ready",
    "/metrics",
];

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record model inference duration (decode included).
pub fn record_inference_duration(model: &str, duration_secs: f64) {
    let labels = [("model", model.to_string())];
    histogram!(names::INFERENCE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a prediction outcome ("ok", "degraded", or an error kind).
pub fn record_prediction(endpoint: &str, outcome: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::PREDICTIONS_TOTAL, &labels).increment(1);
}

/// Record a scored soil condition.
pub fn record_soil_condition(condition: &str) {
    let labels = [("condition", condition.to_string())];
    counter!(names::SOIL_CONDITIONS_TOTAL, &labels).increment(1);
}

/// Collapse unknown paths so probes cannot blow up label cardinality.
fn sanitize_path(path: &str) -> String {
    if KNOWN_PATHS.contains(&path) {
        path.to_string()
    } else {
        "/other".to_string()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/predict_soil"), "/predict_soil");
        assert_eq!(sanitize_path("/wp-admin/setup.php"), "/other");
    }
}
