//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define autostart metrics (run outcomes, durations, management calls)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `autostart_runs_total` (counter): finished runs by outcome
//! - `autostart_run_duration_seconds` (histogram): time from request to outcome
//! - `autostart_resumes_total` (counter): resume actions issued
//! - `autostart_remote_calls_total` (counter): management calls by operation, status
//! - `autostart_remote_call_duration_seconds` (histogram): management call latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished run.
pub fn record_run(outcome: &'static str, start: Instant) {
    counter!("autostart_runs_total", "outcome" => outcome).increment(1);
    histogram!("autostart_run_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record that a resume action was issued.
pub fn record_resume() {
    counter!("autostart_resumes_total").increment(1);
}

/// Record a management call. `status` is `None` for transport failures.
pub fn record_remote_call(operation: &'static str, status: Option<u16>, start: Instant) {
    let status = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "error".to_string());
    counter!("autostart_remote_calls_total", "operation" => operation, "status" => status)
        .increment(1);
    histogram!("autostart_remote_call_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}
