//! Configuration module for the housing prediction service.

use crate::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for a serving process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Fitted artifact locations.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    /// Prediction log storage.
    #[serde(default)]
    pub prediction_log: PredictionLogConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HousingError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            HousingError::Config(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_body_bytes == 0 {
            return Err(HousingError::InvalidConfig {
                field: "server.max_body_bytes".to_string(),
                reason: "Body limit must be non-zero".to_string(),
            });
        }

        if self.artifacts.model_path.as_os_str().is_empty() {
            return Err(HousingError::InvalidConfig {
                field: "artifacts.model_path".to_string(),
                reason: "Model path must not be empty".to_string(),
            });
        }

        if self.artifacts.scaler_path.as_os_str().is_empty() {
            return Err(HousingError::InvalidConfig {
                field: "artifacts.scaler_path".to_string(),
                reason: "Scaler path must not be empty".to_string(),
            });
        }

        if self.prediction_log.db_path.as_os_str().is_empty() {
            return Err(HousingError::InvalidConfig {
                field: "prediction_log.db_path".to_string(),
                reason: "Database path must not be empty".to_string(),
            });
        }

        if self.prediction_log.busy_timeout_ms == 0 {
            return Err(HousingError::InvalidConfig {
                field: "prediction_log.busy_timeout_ms".to_string(),
                reason: "Busy timeout must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Create a configuration rooted in the working directory, for local runs.
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
                ..ServerConfig::default()
            },
            observability: ObservabilityConfig {
                log_level: "debug".to_string(),
                ..ObservabilityConfig::default()
            },
            ..Self::default()
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the prediction API.
    pub bind_addr: SocketAddr,
    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors")]
    pub cors: bool,
    /// Largest predict body read before the request is refused.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_cors() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Locations of the fitted artifacts loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Fitted regression model.
    pub model_path: PathBuf,
    /// Fitted standardization parameters.
    pub scaler_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/best_model.json"),
            scaler_path: PathBuf::from("models/scaler.json"),
        }
    }
}

/// Prediction log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionLogConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl PredictionLogConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for PredictionLogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("prediction_logs.db"),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics_enabled: bool,
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
