//! housing-serve - California Housing price prediction service.
//!
//! Serves a previously fitted regression model behind a small REST API. Each
//! inbound record is aligned to the column layout the model was fitted on,
//! standardized with the fitted scaler, scored, and logged to an append-only
//! SQLite table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  HTTP: GET / | GET /health | POST /predict | GET /metrics   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline: Feature Aligner → Scaler → Regressor             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Prediction Log (SQLite) | Prometheus recorder | tracing    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use housing_serve::config::ServiceConfig;
//!
//! #[tokio::main]
//! async fn main() -> housing_serve::Result<()> {
//!     let config = ServiceConfig::development();
//!     housing_serve::observability::init(&config.observability)?;
//!
//!     // Refuses to start if either artifact is missing
//!     housing_serve::run(config).await
//! }
//! ```

pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod features;
pub mod health;
pub mod observability;
pub mod prediction_log;
pub mod serving;
pub mod shutdown;

// Re-exports
pub use error::{HousingError, Result};

use config::ServiceConfig;
use serving::ServiceContext;
use shutdown::{ShutdownCoordinator, SignalHandler};
use tracing::{error, info};

/// Run the prediction server with the given configuration.
///
/// Artifacts are loaded and the prediction log is opened before the listener is
/// bound; if either fails the error is returned and nothing is served.
pub async fn run(config: ServiceConfig) -> Result<()> {
    info!(addr = %config.server.bind_addr, "Starting housing prediction service");

    let ctx = ServiceContext::from_config(&config).map_err(|e| {
        error!(error = %e, "Startup aborted");
        e
    })?;

    let coordinator = ShutdownCoordinator::new();
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        SignalHandler::new(signal_coordinator).run().await;
    });

    serving::run_server(ctx, &config, coordinator).await?;

    info!("Housing prediction service shutdown complete");
    Ok(())
}
