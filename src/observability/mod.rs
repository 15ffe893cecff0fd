//! Observability for the prediction service.
//!
//! Provides logging initialisation and the Prometheus metrics recorder, plus the
//! helpers the HTTP layer uses to record request counts and latencies.

use crate::config::ObservabilityConfig;
use crate::error::{HousingError, Result};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Latency buckets, in seconds, for the request duration histogram.
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();
static INSTALL_LOCK: Mutex<()> = Mutex::new(());

/// Initialize logging.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| HousingError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| HousingError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!("Observability initialized");
    Ok(())
}

/// Install the process-wide Prometheus recorder.
///
/// Safe to call more than once; later calls return the handle of the recorder
/// installed first.
pub fn install_metrics() -> Result<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS.get() {
        return Ok(handle.clone());
    }

    let _guard = INSTALL_LOCK
        .lock()
        .map_err(|_| HousingError::Internal("metrics install lock poisoned".to_string()))?;
    if let Some(handle) = PROMETHEUS.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| HousingError::Internal(format!("Invalid histogram buckets: {}", e)))?
        .install_recorder()
        .map_err(|e| HousingError::Internal(format!("Failed to install metrics recorder: {}", e)))?;

    register_metrics();
    let _ = PROMETHEUS.set(handle.clone());
    info!("Prometheus recorder installed");
    Ok(handle)
}

/// Periodically drain histogram buffers so they do not grow between scrapes.
pub fn spawn_upkeep(handle: PrometheusHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            interval.tick().await;
            handle.run_upkeep();
            debug!("Metrics upkeep complete");
        }
    })
}

/// Register standard metrics so they render before the first request.
fn register_metrics() {
    counter!("housing_predictions_total", "outcome" => "success").absolute(0);
    counter!("housing_predictions_total", "outcome" => "failure").absolute(0);
    counter!("housing_prediction_rows_total").absolute(0);
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, handler: &str, status: u16, elapsed: Duration) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "handler" => handler.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "handler" => handler.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record the outcome of a predict call.
pub fn record_prediction(success: bool, rows: usize) {
    let outcome = if success { "success" } else { "failure" };
    counter!("housing_predictions_total", "outcome" => outcome).increment(1);
    if success {
        counter!("housing_prediction_rows_total").increment(rows as u64);
    }
}
