//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with latency histograms and
//! standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all PaperDraft metrics
pub const METRICS_PREFIX: &str = "paperdraft";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
];

/// Buckets for LLM call latency (long-tail generation runs)
pub const LLM_BUCKETS: &[f64] = &[
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
    60.00, // 1m
    120.0, // 2m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // LLM metrics
    describe_counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total LLM API requests"
    );

    describe_histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "LLM call latency in seconds"
    );

    describe_counter!(
        format!("{}_llm_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total LLM API errors"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_papers_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total papers created"
    );

    describe_counter!(
        format!("{}_generations_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation runs by kind and outcome"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end generation latency in seconds"
    );

    // Export metrics
    describe_counter!(
        format!("{}_exports_total", METRICS_PREFIX),
        Unit::Count,
        "Total document exports by format"
    );

    describe_histogram!(
        format!("{}_export_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Export rendering and upload latency in seconds"
    );

    // Knowledge base metrics
    describe_counter!(
        format!("{}_documents_uploaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total knowledge documents uploaded"
    );

    describe_counter!(
        format!("{}_knowledge_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Total knowledge base questions answered"
    );

    // Database metrics
    describe_gauge!(
        format!("{}_db_connections_active", METRICS_PREFIX),
        Unit::Count,
        "Active database connections"
    );

    describe_histogram!(
        format!("{}_db_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Database query latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record LLM call metrics
pub fn record_llm_call(duration_secs: f64, model: &str, operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_llm_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string(),
            "operation" => operation.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_llm_errors_total", METRICS_PREFIX),
            "model" => model.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

/// Helper to record a completed generation run
pub fn record_generation(duration_secs: f64, kind: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generations_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);
}

/// Helper to record an export
pub fn record_export(duration_secs: f64, format: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_exports_total", METRICS_PREFIX),
        "format" => format.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_export_duration_seconds", METRICS_PREFIX),
        "format" => format.to_string()
    )
    .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        let mut prev = 0.0;
        for &bucket in LLM_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/v1/papers");
        std::thread::sleep(std::time::Duration::from_millis(5));
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
