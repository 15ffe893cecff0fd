// Fitted standardization transform

use crate::error::{HousingError, Result};
use crate::features::FEATURE_COLUMNS;
use serde::{Deserialize, Serialize};

/// Per-column standardization parameters, frozen at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column names in fit order (optional in the artifact)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Fitted mean per column
    pub mean: Vec<f64>,
    /// Fitted standard deviation per column
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Creates a scaler from fitted parameters
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            feature_names: None,
            mean,
            scale,
        };
        scaler.validated()
    }

    /// Attaches the column names the parameters were fitted on
    pub fn with_feature_names(mut self, names: &[&str]) -> Self {
        self.feature_names = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Checks parameter consistency and normalizes zero scales
    pub(crate) fn validated(mut self) -> Result<Self> {
        if self.mean.is_empty() {
            return Err(HousingError::Transform("scaler has no fitted columns".to_string()));
        }
        if self.mean.len() != self.scale.len() {
            return Err(HousingError::Transform(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(HousingError::Transform(format!(
                    "scaler has {} feature names but {} columns",
                    names.len(),
                    self.mean.len()
                )));
            }
            if names.iter().map(String::as_str).ne(FEATURE_COLUMNS.iter().copied()) {
                return Err(HousingError::Transform(format!(
                    "scaler was fitted on columns {:?}, expected {:?}",
                    names, FEATURE_COLUMNS
                )));
            }
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(HousingError::Transform(
                "scaler parameters must be finite".to_string(),
            ));
        }

        // Constant columns are fitted with a zero deviation; they pass through unscaled
        for s in &mut self.scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(self)
    }

    /// Number of fitted columns
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardizes each row: `(x - mean) / scale`
    pub fn transform<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let row = self.check_width(i, row.as_ref())?;
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (mean, scale))| (x - mean) / scale)
                    .collect())
            })
            .collect()
    }

    /// Reverses [`transform`](Self::transform): `x * scale + mean`
    pub fn inverse_transform<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let row = self.check_width(i, row.as_ref())?;
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (mean, scale))| x * scale + mean)
                    .collect())
            })
            .collect()
    }

    fn check_width<'a>(&self, index: usize, row: &'a [f64]) -> Result<&'a [f64]> {
        if row.len() != self.n_features() {
            return Err(HousingError::Transform(format!(
                "row {} has {} columns, scaler was fitted on {}",
                index,
                row.len(),
                self.n_features()
            )));
        }
        Ok(row)
    }
}
