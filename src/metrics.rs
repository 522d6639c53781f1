use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names emitted by the pipeline
///
/// Nothing is exported unless the embedding process installs a recorder.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Data preparation metrics
    pub rows_loaded_total: &'static str,
    pub rows_dropped_total: &'static str,
    pub dataset_rows: &'static str,

    // Remote workflow metrics
    pub poll_attempts_total: &'static str,
    pub resource_wait_duration: &'static str,
    pub resources_reused_total: &'static str,

    // Pipeline metrics
    pub stage_duration: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            rows_loaded_total: "recommender_rows_loaded_total",
            rows_dropped_total: "recommender_rows_dropped_total",
            dataset_rows: "recommender_dataset_rows",

            poll_attempts_total: "recommender_poll_attempts_total",
            resource_wait_duration: "recommender_resource_wait_duration_seconds",
            resources_reused_total: "recommender_resources_reused_total",

            stage_duration: "recommender_stage_duration_seconds",

            errors_total: "recommender_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record rows read from the raw extract
    pub fn record_rows_loaded(&self, count: usize) {
        counter!(self.rows_loaded_total).increment(count as u64);
    }

    /// Record rows discarded during reshaping
    pub fn record_rows_dropped(&self, count: usize, reason: &str) {
        if count == 0 {
            return;
        }
        counter!(self.rows_dropped_total, "reason" => reason.to_string()).increment(count as u64);
    }

    /// Record the size of a built table
    pub fn record_dataset_rows(&self, dataset: &str, count: usize) {
        gauge!(self.dataset_rows, "dataset" => dataset.to_string()).set(count as f64);
    }

    /// Record one status poll
    pub fn record_poll_attempt(&self, resource: &str) {
        counter!(self.poll_attempts_total, "resource" => resource.to_string()).increment(1);
    }

    /// Record how long a resource took to settle
    pub fn record_resource_wait(&self, resource: &str, duration: Duration, outcome: &str) {
        histogram!(
            self.resource_wait_duration,
            "resource" => resource.to_string(),
            "outcome" => outcome.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a resource found by name instead of created
    pub fn record_resource_reused(&self, resource: &str) {
        counter!(self.resources_reused_total, "resource" => resource.to_string()).increment(1);
    }

    /// Record how long a pipeline stage ran
    pub fn record_stage_duration(&self, stage: &str, duration: Duration, outcome: &str) {
        histogram!(
            self.stage_duration,
            "stage" => stage.to_string(),
            "outcome" => outcome.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        counter!(
            self.errors_total,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}
