//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rejected_total` (counter): requests stopped by route validation, by reason
//! - `gateway_rate_limited_total` (counter): 429 responses
//! - `gateway_rate_limit_storage_errors_total` (counter): failed counter-store calls, by backend
//! - `gateway_compression_total` (counter): compression outcomes, by status
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    describe_counter!("gateway_requests_total", Unit::Count, "Total HTTP requests processed");
    describe_histogram!(
        "gateway_request_duration_seconds",
        Unit::Seconds,
        "Request duration from the gateway's perspective"
    );
    describe_counter!(
        "gateway_rejected_total",
        Unit::Count,
        "Requests rejected by route/method validation"
    );
    describe_counter!(
        "gateway_rate_limited_total",
        Unit::Count,
        "Requests rejected by the rate limiter"
    );
    describe_counter!(
        "gateway_rate_limit_storage_errors_total",
        Unit::Count,
        "Rate limit storage failures (requests admitted)"
    );
    describe_counter!(
        "gateway_compression_total",
        Unit::Count,
        "Compression decisions and outcomes"
    );

    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!("gateway_rejected_total", "reason" => reason).increment(1);
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_storage_error(backend: &'static str) {
    counter!("gateway_rate_limit_storage_errors_total", "backend" => backend).increment(1);
}

pub fn record_compression(status: &'static str) {
    counter!("gateway_compression_total", "status" => status).increment(1);
}

/// Middleware: count and time every request.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    record_request(method.as_str(), response.status().as_u16(), start);
    response
}
