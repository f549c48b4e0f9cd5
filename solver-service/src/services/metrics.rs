//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint body.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Call once at startup before any metrics are recorded. Later calls are
/// ignored with a warning.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        tracing::warn!("Metrics recorder already initialized");
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::error!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Record one finished solve.
pub fn record_solve(outcome: &'static str, elapsed: Duration) {
    counter!("solver_requests_total", "outcome" => outcome).increment(1);
    histogram!("solver_processing_seconds", "outcome" => outcome).record(elapsed.as_secs_f64());
}
