//! Metrics collection.
//!
//! Counters go through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.
//!
//! # Metrics
//! - `client_requests_total` (counter): completed gateway calls by method, status
//! - `client_retries_total` (counter): retries by cause
//! - `client_circuit_transitions_total` (counter): breaker transitions by target state
//! - `client_aggregation_failures_total` (counter): per-location rating fetches that failed

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn metric recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Record a completed gateway call. `status` is "error" when no response arrived.
pub fn record_request(method: &str, status: &str) {
    if enabled() {
        metrics::counter!(
            "client_requests_total",
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

pub fn record_retry(cause: &'static str) {
    if enabled() {
        metrics::counter!("client_retries_total", "cause" => cause).increment(1);
    }
}

pub fn record_circuit_transition(state: &'static str) {
    if enabled() {
        metrics::counter!("client_circuit_transitions_total", "state" => state).increment(1);
    }
}

pub fn record_aggregation_failure() {
    if enabled() {
        metrics::counter!("client_aggregation_failures_total").increment(1);
    }
}
