//! Prometheus metrics, grounded on the teacher's `metrics`/
//! `metrics-exporter-prometheus` pairing (`init_metrics` installed once at
//! startup, a handle rendered by the `/metrics` handler).

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub async fn metrics_handler(axum::extract::State(state): axum::extract::State<AppState>) -> String {
    state.metrics_handle().render()
}

pub fn record_request(method: &str, path: &str, status: u16) {
    counter!("podcast_http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
}

pub fn record_submission() {
    counter!("podcast_tasks_submitted_total").increment(1);
}

pub fn record_submission_rejected(reason: &str) {
    counter!("podcast_tasks_rejected_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_queue_depth(active: usize, max: usize) {
    gauge!("podcast_queue_active_jobs").set(active as f64);
    gauge!("podcast_queue_max_jobs").set(max as f64);
}

pub fn record_cleanup(freed_bytes: u64) {
    histogram!("podcast_cleanup_bytes_freed").record(freed_bytes as f64);
}
