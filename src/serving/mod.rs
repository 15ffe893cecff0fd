//! HTTP serving of the housing price model.
//!
//! Each predict call runs `received → aligned → scaled → predicted → logged →
//! responded`. A failure while aligning, scaling or predicting skips straight to
//! logging the failure and responding with an error. Handlers share a
//! [`ServiceContext`] built once at startup; nothing in it is mutated by traffic.

pub mod handlers;
pub mod middleware;

use crate::compute::FittedArtifacts;
use crate::config::{ServerConfig, ServiceConfig};
use crate::error::{HousingError, Result};
use crate::observability;
use crate::prediction_log::PredictionLog;
use crate::shutdown::ShutdownCoordinator;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

/// Immutable state shared by every request handler.
#[derive(Clone)]
pub struct ServiceContext {
    artifacts: Arc<FittedArtifacts>,
    log: PredictionLog,
    max_body_bytes: usize,
    started_at: Instant,
}

impl ServiceContext {
    pub fn new(artifacts: FittedArtifacts, log: PredictionLog) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
            log,
            max_body_bytes: ServerConfig::default().max_body_bytes,
            started_at: Instant::now(),
        }
    }

    /// Refuse predict bodies larger than `limit` bytes.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Load artifacts and open the prediction log. Any failure here means the
    /// process must not start serving.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let artifacts = FittedArtifacts::load(&config.artifacts)?;
        let log = PredictionLog::open(&config.prediction_log)?;
        Ok(Self::new(artifacts, log).with_body_limit(config.server.max_body_bytes))
    }

    pub fn artifacts(&self) -> &FittedArtifacts {
        &self.artifacts
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Optional surfaces of the router.
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Answer CORS preflights and tag responses for any origin.
    pub cors: bool,
    /// Serve `/metrics` from this recorder and instrument every route.
    pub metrics: Option<PrometheusHandle>,
}

/// Build the API router.
pub fn router(ctx: ServiceContext, options: RouterOptions) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // The predict handler enforces its own limit so oversized bodies are logged
        .route("/predict", post(handlers::predict).layer(DefaultBodyLimit::disable()))
        .route("/predict/", post(handlers::predict).layer(DefaultBodyLimit::disable()))
        .with_state(ctx);

    if let Some(handle) = options.metrics {
        app = app
            .merge(Router::new().route("/metrics", get(handlers::metrics)).with_state(handle))
            .route_layer(from_fn(middleware::track_metrics));
    }

    if options.cors {
        app = app.layer(from_fn(middleware::cors));
    }

    app
}

/// Serve the API until `coordinator` signals shutdown.
pub async fn run_server(
    ctx: ServiceContext,
    config: &ServiceConfig,
    coordinator: ShutdownCoordinator,
) -> Result<()> {
    let metrics = if config.observability.metrics_enabled {
        Some(observability::install_metrics()?)
    } else {
        None
    };
    let upkeep = metrics.clone().map(observability::spawn_upkeep);

    let app = router(
        ctx,
        RouterOptions {
            cors: config.server.cors,
            metrics,
        },
    );

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "Prediction API listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { coordinator.wait_for_shutdown().await })
        .await
        .map_err(|e| HousingError::Network(e.to_string()));

    if let Some(upkeep) = upkeep {
        upkeep.abort();
    }

    served?;
    info!("Prediction API stopped");
    Ok(())
}
