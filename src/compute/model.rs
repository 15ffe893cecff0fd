// Fitted regression estimators

use crate::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimator family of a fitted model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Ordinary least squares
    LinearRegression,
    /// CART regression tree
    DecisionTree,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::LinearRegression => f.write_str("linear_regression"),
            ModelKind::DecisionTree => f.write_str("decision_tree"),
        }
    }
}

/// Linear regression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// One coefficient per feature
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

impl LinearModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

/// Marker for a leaf in the child arrays
pub const TREE_LEAF: i64 = -1;

/// Regression tree in flat node-array layout
///
/// Node `i` is a leaf when both children are [`TREE_LEAF`]. Otherwise rows with
/// `row[feature[i]] <= threshold[i]` descend to `children_left[i]`, the rest to
/// `children_right[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeModel {
    /// Width of the rows the tree was fitted on
    pub n_features: usize,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Leaf estimate per node
    pub value: Vec<f64>,
}

impl TreeModel {
    fn node_count(&self) -> usize {
        self.value.len()
    }

    fn validate(&self) -> Result<()> {
        let n = self.node_count();
        if n == 0 {
            return Err(HousingError::Prediction("decision tree has no nodes".to_string()));
        }
        for (name, len) in [
            ("children_left", self.children_left.len()),
            ("children_right", self.children_right.len()),
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
        ] {
            if len != n {
                return Err(HousingError::Prediction(format!(
                    "decision tree {} has {} entries, expected {}",
                    name, len, n
                )));
            }
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF && right == TREE_LEAF {
                continue;
            }
            // Forward-only children guarantee traversal terminates
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(HousingError::Prediction(format!(
                        "decision tree node {} has invalid child {}",
                        node, child
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= self.n_features {
                return Err(HousingError::Prediction(format!(
                    "decision tree node {} splits on feature {} of {}",
                    node, feature, self.n_features
                )));
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// A fitted regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    LinearRegression(LinearModel),
    DecisionTree(TreeModel),
}

impl Regressor {
    /// Creates a linear model
    pub fn linear(coefficients: Vec<f64>, intercept: f64) -> Self {
        Regressor::LinearRegression(LinearModel {
            coefficients,
            intercept,
        })
    }

    /// Estimator family
    pub fn kind(&self) -> ModelKind {
        match self {
            Regressor::LinearRegression(_) => ModelKind::LinearRegression,
            Regressor::DecisionTree(_) => ModelKind::DecisionTree,
        }
    }

    /// Width of the rows this model accepts
    pub fn n_features(&self) -> usize {
        match self {
            Regressor::LinearRegression(m) => m.coefficients.len(),
            Regressor::DecisionTree(t) => t.n_features,
        }
    }

    /// Checks internal consistency of the fitted parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Regressor::LinearRegression(m) => {
                if m.coefficients.is_empty() {
                    return Err(HousingError::Prediction(
                        "linear model has no coefficients".to_string(),
                    ));
                }
                if !m.intercept.is_finite() || m.coefficients.iter().any(|w| !w.is_finite()) {
                    return Err(HousingError::Prediction(
                        "linear model parameters must be finite".to_string(),
                    ));
                }
                Ok(())
            }
            Regressor::DecisionTree(t) => t.validate(),
        }
    }

    /// Predicts one value per row, in row order
    pub fn predict<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<f64>> {
        let width = self.n_features();
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let row = row.as_ref();
                if row.len() != width {
                    return Err(HousingError::Prediction(format!(
                        "row {} has {} features, model expects {}",
                        i,
                        row.len(),
                        width
                    )));
                }
                let estimate = match self {
                    Regressor::LinearRegression(m) => m.predict_row(row),
                    Regressor::DecisionTree(t) => t.predict_row(row),
                };
                if !estimate.is_finite() {
                    return Err(HousingError::Prediction(format!(
                        "row {} produced a non-finite estimate",
                        i
                    )));
                }
                Ok(estimate)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // x0 <= 0.5 ? (x1 <= 0.0 ? 1.0 : 2.0) : 3.0
    fn small_tree() -> Regressor {
        Regressor::DecisionTree(TreeModel {
            n_features: 2,
            children_left: vec![1, 2, -1, -1, -1],
            children_right: vec![4, 3, -1, -1, -1],
            feature: vec![0, 1, -2, -2, -2],
            threshold: vec![0.5, 0.0, -2.0, -2.0, -2.0],
            value: vec![2.0, 1.5, 1.0, 2.0, 3.0],
        })
    }

    #[test]
    fn test_linear_prediction() {
        let model = Regressor::linear(vec![2.0, -1.0], 0.5);
        let out = model.predict(&[[1.0, 1.0], [0.0, 2.0]]).unwrap();
        assert_eq!(out, vec![1.5, -1.5]);
        assert_eq!(model.kind(), ModelKind::LinearRegression);
    }

    #[test]
    fn test_tree_prediction_preserves_order() {
        let model = small_tree();
        model.validate().unwrap();
        let out = model
            .predict(&[[0.0, -1.0], [0.0, 1.0], [1.0, 0.0], [0.5, 0.0]])
            .unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_width_mismatch_fails_request() {
        let model = Regressor::linear(vec![1.0; 13], 0.0);
        let err = model.predict(&[vec![1.0; 8]]).unwrap_err();
        assert!(matches!(err, HousingError::Prediction(_)));
    }

    #[test]
    fn test_tree_validation() {
        let mut tree = match small_tree() {
            Regressor::DecisionTree(t) => t,
            _ => unreachable!(),
        };
        tree.children_left[1] = 0;
        assert!(Regressor::DecisionTree(tree.clone()).validate().is_err());

        tree.children_left[1] = 2;
        tree.feature[0] = 7;
        assert!(Regressor::DecisionTree(tree.clone()).validate().is_err());

        tree.feature[0] = 0;
        tree.threshold.pop();
        assert!(Regressor::DecisionTree(tree).validate().is_err());
    }

    #[test]
    fn test_artifact_format() {
        let json = r#"{"kind": "linear_regression", "coefficients": [1.0, 2.0], "intercept": 0.25}"#;
        let model: Regressor = serde_json::from_str(json).unwrap();
        assert_eq!(model, Regressor::linear(vec![1.0, 2.0], 0.25));
        assert_eq!(model.kind().to_string(), "linear_regression");
    }
}
