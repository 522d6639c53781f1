//! Tracing setup and pipeline stage timing.

use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::metrics::MetricsCollector;

const DEFAULT_LOG_FILE: &str = "recommender.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize structured logging
///
/// `RUST_LOG` wins over `log_level`. The console gets text or JSON on stderr
/// depending on `format`, so stdout stays free for command output. With
/// `log_file`, JSON lines also go to a daily rolling file in the same
/// directory; hold the returned guard until exit or buffered lines are lost.
pub fn init_logging(log_level: Option<&str>, format: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .map_err(|e| anyhow!("Failed to create log filter: {}", e))?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(format)];
    let guard = log_file.map(|path| {
        let (layer, guard) = file_layer(path);
        layers.push(layer);
        guard
    });

    Registry::default()
        .with(layers.with_filter(env_filter))
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    info!(format, file = ?log_file, "Logging initialized");
    Ok(guard)
}

fn console_layer(format: &str) -> BoxedLayer {
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    if format == "json" {
        layer.json().boxed()
    } else {
        layer.with_ansi(true).boxed()
    }
}

fn file_layer(path: &Path) -> (BoxedLayer, WorkerGuard) {
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| DEFAULT_LOG_FILE.to_string(), |n| n.to_string_lossy().into_owned());
    let (writer, guard) = non_blocking(rolling::daily(directory, file_name));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .json()
        .boxed();
    (layer, guard)
}

/// Times a pipeline stage.
///
/// `finish` logs and records a successful stage; a timer dropped without
/// `finish` (the stage returned early with an error) is recorded as failed.
pub struct OperationTimer {
    stage: &'static str,
    start: Instant,
    finished: bool,
    metrics: MetricsCollector,
}

impl OperationTimer {
    pub fn new(stage: &'static str) -> Self {
        info!(stage, "Stage started");
        Self {
            stage,
            start: Instant::now(),
            finished: false,
            metrics: MetricsCollector::default(),
        }
    }

    /// Elapsed milliseconds
    pub fn finish(mut self) -> u128 {
        self.finished = true;
        let elapsed = self.start.elapsed();
        self.metrics.record_stage_duration(self.stage, elapsed, "success");
        info!(stage = self.stage, duration_ms = elapsed.as_millis(), "Stage completed");
        elapsed.as_millis()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        let elapsed = self.start.elapsed();
        self.metrics.record_stage_duration(self.stage, elapsed, "failure");
        warn!(stage = self.stage, duration_ms = elapsed.as_millis(), "Stage aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_reports_elapsed() {
        let timer = OperationTimer::new("train");
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.finish() >= 2);
    }

    #[test]
    fn test_dropped_timer_does_not_panic() {
        let timer = OperationTimer::new("write_and_upload");
        drop(timer);
    }
}
