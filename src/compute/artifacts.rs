// Startup loading of the fitted scaler and model

use super::model::Regressor;
use super::scaler::StandardScaler;
use crate::config::ArtifactConfig;
use crate::error::{HousingError, Result};
use crate::features::{CanonicalVector, FEATURE_COUNT};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{error, info};

/// The fitted scaler and model pair, immutable after load
#[derive(Debug, Clone)]
pub struct FittedArtifacts {
    scaler: StandardScaler,
    model: Regressor,
}

impl FittedArtifacts {
    /// Pairs an already fitted scaler and model, checking they agree on layout
    pub fn new(scaler: StandardScaler, model: Regressor) -> Result<Self> {
        let scaler = checked_scaler(scaler)?;
        Self::pair(scaler, model)
    }

    fn pair(scaler: StandardScaler, model: Regressor) -> Result<Self> {
        model.validate()?;
        if model.n_features() != scaler.n_features() {
            return Err(HousingError::Prediction(format!(
                "model expects {} features, scaler produces {}",
                model.n_features(),
                scaler.n_features()
            )));
        }

        Ok(Self { scaler, model })
    }

    /// Loads both artifacts from disk; any failure aborts startup
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let scaler: StandardScaler = read_artifact(&config.scaler_path)?;
        let scaler = checked_scaler(scaler).map_err(|e| {
            error!(path = %config.scaler_path.display(), error = %e, "Fitted scaler is unusable");
            HousingError::artifact(&config.scaler_path, e.to_string())
        })?;

        let model: Regressor = read_artifact(&config.model_path)?;
        let artifacts = Self::pair(scaler, model).map_err(|e| {
            error!(path = %config.model_path.display(), error = %e, "Fitted model does not match the scaler");
            HousingError::artifact(&config.model_path, e.to_string())
        })?;

        info!(
            model = %artifacts.model.kind(),
            features = artifacts.scaler.n_features(),
            "Model and scaler loaded successfully"
        );
        Ok(artifacts)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &Regressor {
        &self.model
    }

    /// Scales and predicts a batch of aligned rows
    pub fn predict(&self, rows: &[CanonicalVector]) -> Result<Vec<f64>> {
        let scaled = self.scaler.transform(rows)?;
        self.model.predict(&scaled)
    }
}

fn checked_scaler(scaler: StandardScaler) -> Result<StandardScaler> {
    let scaler = scaler.validated()?;
    if scaler.n_features() != FEATURE_COUNT {
        return Err(HousingError::Transform(format!(
            "scaler was fitted on {} columns, serving layout has {}",
            scaler.n_features(),
            FEATURE_COUNT
        )));
    }
    Ok(scaler)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to read artifact");
        HousingError::artifact(path, e.to_string())
    })?;

    serde_json::from_str(&content).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to parse artifact");
        HousingError::artifact(path, e.to_string())
    })
}
