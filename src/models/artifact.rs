//! Model and scaler artifacts.
//!
//! The predictor only relies on two small contracts:
//! - `Scaler::transform(matrix) -> matrix` on the `SCALED_COLUMNS` subset
//! - `Regressor::predict(matrix) -> vector` on the full `MODEL_COLUMNS` row
//!
//! Artifacts are trained elsewhere and exported as JSON. Each carries the
//! `feature_names` it was fitted on so a mismatched file is caught at load time
//! rather than producing garbage prices.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// A fitted regressor.
pub trait Regressor: Send + Sync + std::fmt::Debug {
    /// Predict one value per row of `features`.
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError>;
}

/// A fitted column-wise normalizer.
pub trait Scaler: Send + Sync + std::fmt::Debug {
    fn transform(&self, features: &DMatrix<f64>) -> Result<DMatrix<f64>, ArtifactError>;
}

/// Model file contents (`model_{DEPT}_optimized.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn feature_names(&self) -> &[String] {
        match self {
            ModelArtifact::Linear(m) => &m.feature_names,
            ModelArtifact::TreeEnsemble(m) => &m.feature_names,
        }
    }

    /// Structural checks that don't depend on the column contract.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::TreeEnsemble(m) => m.validate(),
        }
    }
}

impl Regressor for ModelArtifact {
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError> {
        match self {
            ModelArtifact::Linear(m) => m.predict(features),
            ModelArtifact::TreeEnsemble(m) => m.predict(features),
        }
    }
}

/// `y = intercept + x · coefficients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressor {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(ArtifactError::Malformed(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError> {
        check_width(features, self.coefficients.len())?;
        let beta = DVector::from_column_slice(&self.coefficients);
        Ok((features * beta).add_scalar(self.intercept))
    }
}

/// Additive ensemble of regression trees (gradient-boosting export).
///
/// `y = base_score + learning_rate * Σ tree(x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Flat node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    fn evaluate(&self, row: &[f64]) -> Result<f64, ArtifactError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).copied().ok_or_else(|| {
                        ArtifactError::Malformed(format!("split on missing feature {feature}"))
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ArtifactError::Malformed(format!("dangling node index {idx}")));
                }
            }
        }
        Err(ArtifactError::Malformed("tree contains a cycle".to_string()))
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ArtifactError> {
        let width = self.feature_names.len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ArtifactError::Malformed(format!("tree {t} has no nodes")));
            }
            for node in &tree.nodes {
                if let TreeNode::Split {
                    feature, left, right, ..
                } = node
                {
                    if *feature >= width || *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                        return Err(ArtifactError::Malformed(format!(
                            "tree {t} references an out-of-range feature or child"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError> {
        check_width(features, self.feature_names.len())?;
        let mut out = DVector::zeros(features.nrows());
        for (i, row) in features.row_iter().enumerate() {
            let row: Vec<f64> = row.iter().copied().collect();
            let mut sum = 0.0;
            for tree in &self.trees {
                sum += tree.evaluate(&row)?;
            }
            out[i] = self.base_score + self.learning_rate * sum;
        }
        Ok(out)
    }
}

/// Standardization: `(x - mean) / scale`, column-wise.
///
/// A zero scale (constant training column) is treated as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.feature_names.len();
        if self.mean.len() != n || self.scale.len() != n {
            return Err(ArtifactError::Malformed(format!(
                "scaler has {n} features but {} means and {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &DMatrix<f64>) -> Result<DMatrix<f64>, ArtifactError> {
        self.validate()?;
        check_width(features, self.mean.len())?;
        let mut out = features.clone();
        for (j, mut column) in out.column_iter_mut().enumerate() {
            let scale = if self.scale[j] == 0.0 { 1.0 } else { self.scale[j] };
            let mean = self.mean[j];
            column.apply(|x| *x = (*x - mean) / scale);
        }
        Ok(out)
    }
}

/// Verify an artifact was fitted on exactly `expected`, in that order.
pub fn check_feature_names(actual: &[String], expected: &[&str]) -> Result<(), ArtifactError> {
    if actual.len() != expected.len() {
        return Err(ArtifactError::ColumnMismatch(format!(
            "expected {} columns, artifact has {}",
            expected.len(),
            actual.len()
        )));
    }
    if let Some((pos, (a, e))) = actual
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (a, e))| a.as_str() != **e)
    {
        return Err(ArtifactError::ColumnMismatch(format!(
            "column {pos} is '{a}', expected '{e}'"
        )));
    }
    Ok(())
}

fn check_width(features: &DMatrix<f64>, expected: usize) -> Result<(), ArtifactError> {
    if features.ncols() != expected {
        return Err(ArtifactError::ShapeMismatch {
            expected,
            actual: features.ncols(),
        });
    }
    Ok(())
}

/// Read a model artifact from JSON.
pub fn read_model_json(path: &Path) -> Result<ModelArtifact, String> {
    let file = File::open(path).map_err(|e| format!("failed to open '{}': {e}", path.display()))?;
    let model: ModelArtifact = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("invalid model JSON '{}': {e}", path.display()))?;
    model.validate().map_err(|e| e.to_string())?;
    Ok(model)
}

/// Read a scaler artifact from JSON.
pub fn read_scaler_json(path: &Path) -> Result<StandardScaler, String> {
    let file = File::open(path).map_err(|e| format!("failed to open '{}': {e}", path.display()))?;
    let scaler: StandardScaler = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("invalid scaler JSON '{}': {e}", path.display()))?;
    scaler.validate().map_err(|e| e.to_string())?;
    Ok(scaler)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn linear_predicts_row_wise() {
        let m = LinearRegressor {
            feature_names: names(2),
            coefficients: vec![2.0, -1.0],
            intercept: 0.5,
        };
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 3.0, 0.0]);
        let y = m.predict(&x).unwrap();
        assert_eq!(y.as_slice(), &[1.5, 6.5]);
    }

    #[test]
    fn linear_rejects_wrong_width() {
        let m = LinearRegressor {
            feature_names: names(3),
            coefficients: vec![1.0; 3],
            intercept: 0.0,
        };
        let err = m.predict(&DMatrix::zeros(1, 2)).unwrap_err();
        assert_eq!(err, ArtifactError::ShapeMismatch { expected: 3, actual: 2 });
    }

    #[test]
    fn tree_ensemble_sums_leaves() {
        let json = r#"{
            "kind": "tree_ensemble",
            "feature_names": ["f0", "f1"],
            "base_score": 1.0,
            "learning_rate": 0.5,
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 2.0, "left": 1, "right": 2},
                    {"value": 4.0},
                    {"value": -2.0}
                ]},
                {"nodes": [{"value": 2.0}]}
            ]
        }"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        model.validate().unwrap();

        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 5.0, 0.0]);
        let y = model.predict(&x).unwrap();
        // row 0: 1 + 0.5 * (4 + 2) = 4; row 1: 1 + 0.5 * (-2 + 2) = 1
        assert_eq!(y.as_slice(), &[4.0, 1.0]);
    }

    #[test]
    fn tree_validation_catches_bad_children() {
        let model = ModelArtifact::TreeEnsemble(TreeEnsemble {
            feature_names: names(1),
            base_score: 0.0,
            learning_rate: 1.0,
            trees: vec![RegressionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 5,
                }],
            }],
        });
        assert!(matches!(model.validate(), Err(ArtifactError::Malformed(_))));
    }

    #[test]
    fn cyclic_tree_errors_instead_of_looping() {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 10.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(tree.evaluate(&[1.0]).is_err());
    }

    #[test]
    fn scaler_standardizes_and_guards_zero_scale() {
        let s = StandardScaler {
            feature_names: names(2),
            mean: vec![1.0, 5.0],
            scale: vec![2.0, 0.0],
        };
        let x = DMatrix::from_row_slice(1, 2, &[5.0, 7.0]);
        let t = s.transform(&x).unwrap();
        assert_eq!(t[(0, 0)], 2.0);
        assert_eq!(t[(0, 1)], 2.0);
    }

    #[test]
    fn feature_name_check_reports_first_mismatch() {
        let actual = vec!["a".to_string(), "c".to_string()];
        let err = check_feature_names(&actual, &["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("column 1 is 'c'"), "{err}");
        assert!(check_feature_names(&actual, &["a"]).is_err());
        assert!(check_feature_names(&actual, &["a", "c"]).is_ok());
    }
}
