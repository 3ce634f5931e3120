//! Request metrics
//!
//! Recorded through the `metrics` facade; install any recorder to export them.

use std::time::Duration;

/// Record a completed request
pub fn record_request(endpoint: &str, method: &str, status: u16, duration: Duration) {
    metrics::counter!(
        "esdsl_requests_total",
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "esdsl_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record a request that never got a response
pub fn record_request_error(endpoint: &str, error_type: &str) {
    metrics::counter!(
        "esdsl_request_errors_total",
        "endpoint" => endpoint.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record items rejected inside a bulk response
pub fn record_bulk_failures(failed: usize) {
    metrics::counter!("esdsl_bulk_failed_items_total").increment(failed as u64);
}
