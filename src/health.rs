//! Liveness and health payloads.
//!
//! Neither payload touches the prediction log or any other external dependency:
//! a process that is serving at all has already loaded its artifacts.

use crate::compute::ModelKind;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Message returned by the root liveness probe.
pub const ROOT_MESSAGE: &str = "California Housing Prediction API is up!";

/// Root liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootMessage {
    pub message: String,
}

impl Default for RootMessage {
    fn default() -> Self {
        Self {
            message: ROOT_MESSAGE.to_string(),
        }
    }
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Estimator family being served.
    pub model: ModelKind,
    /// Width of the canonical feature vector.
    pub features: usize,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(model: ModelKind, features: usize, start_time: Instant) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            model,
            features,
            uptime_seconds: start_time.elapsed().as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_serialization() {
        let health = HealthResponse::new(ModelKind::DecisionTree, 13, Instant::now());
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model"], "decision_tree");
        assert_eq!(json["features"], 13);
    }

    #[test]
    fn test_root_message() {
        let json = serde_json::to_value(RootMessage::default()).unwrap();
        assert_eq!(json["message"], ROOT_MESSAGE);
    }
}
