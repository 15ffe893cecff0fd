//! Error types for the housing prediction service.
//!
//! This module provides a unified error type [`HousingError`] for every stage of the
//! serving path, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Request**: malformed bodies and field validation failures (4xx)
//! - **Pipeline**: scaler or model contract drift detected while serving (5xx)
//! - **Startup**: fitted artifacts that cannot be loaded, fatal before serving
//! - **Logging**: prediction log failures, reported and swallowed by the logger
//! - **Configuration**: invalid settings or missing configuration
//!
//! # Example
//!
//! ```rust
//! use housing_serve::error::{HousingError, Result};
//!
//! fn require_positive(name: &str, value: f64) -> Result<f64> {
//!     if value <= 0.0 {
//!         return Err(HousingError::Validation(format!("{} must be positive", name)));
//!     }
//!     Ok(value)
//! }
//!
//! let err = require_positive("households", -1.0).unwrap_err();
//! assert!(err.is_client_error());
//! assert_eq!(err.status_code(), 422);
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for housing service operations.
#[derive(Error, Debug)]
pub enum HousingError {
    // Request errors
    #[error("{0}")]
    Validation(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    // Pipeline errors
    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    // Startup errors
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    // Prediction log errors
    #[error("Prediction log error: {0}")]
    Logging(String),

    #[error("Database error: {0}")]
    Database(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // Transport and external errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HousingError {
    /// Build an artifact load error for `path`.
    pub fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HousingError::ArtifactLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code used when this error ends a request.
    pub fn status_code(&self) -> u16 {
        match self {
            HousingError::MalformedRequest(_) => 400,
            HousingError::PayloadTooLarge { .. } => 413,
            HousingError::Validation(_) => 422,
            _ => 500,
        }
    }

    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<rusqlite::Error> for HousingError {
    fn from(e: rusqlite::Error) -> Self {
        HousingError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for HousingError {
    fn from(e: serde_json::Error) -> Self {
        HousingError::Serialization(e.to_string())
    }
}

/// Result type alias for housing service operations.
pub type Result<T> = std::result::Result<T, HousingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HousingError::MalformedRequest("x".into()).status_code(), 400);
        assert_eq!(HousingError::Validation("x".into()).status_code(), 422);
        assert_eq!(HousingError::PayloadTooLarge { limit: 16 }.status_code(), 413);
        assert!(HousingError::PayloadTooLarge { limit: 16 }.is_client_error());
        assert_eq!(HousingError::Transform("x".into()).status_code(), 500);
        assert_eq!(HousingError::Prediction("x".into()).status_code(), 500);
        assert!(!HousingError::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_artifact_error_message() {
        let err = HousingError::artifact("models/scaler.json", "No such file");
        assert_eq!(
            err.to_string(),
            "Failed to load artifact models/scaler.json: No such file"
        );
    }
}
