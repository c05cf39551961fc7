//! In-memory artifacts for tests.

use nalgebra::{DMatrix, DVector};

use crate::domain::Department;
use crate::error::ArtifactError;
use crate::features::columns::{FeatureColumn, MODEL_COLUMNS, model_column_names, scaled_column_names};
use crate::models::artifact::{LinearRegressor, Regressor, StandardScaler};
use crate::models::registry::{ModelBundle, ModelRegistry};

/// Price = `intercept + 0.5 * days_to_expiry`, every other column ignored.
pub fn linear_model(intercept: f64) -> LinearRegressor {
    let coefficients = MODEL_COLUMNS
        .iter()
        .map(|c| if *c == FeatureColumn::DaysToExpiry { 0.5 } else { 0.0 })
        .collect();
    LinearRegressor {
        feature_names: model_column_names().into_iter().map(String::from).collect(),
        coefficients,
        intercept,
    }
}

pub fn identity_scaler() -> StandardScaler {
    let names: Vec<String> = scaled_column_names().into_iter().map(String::from).collect();
    let n = names.len();
    StandardScaler {
        feature_names: names,
        mean: vec![0.0; n],
        scale: vec![1.0; n],
    }
}

/// Distinct intercept per department so results can be told apart.
pub fn intercept_for(department: Department) -> f64 {
    match department {
        Department::Foods1 => 10.0,
        Department::Foods2 => 20.0,
        Department::Foods3 => 30.0,
    }
}

pub fn bundle_for(department: Department) -> ModelBundle {
    ModelBundle::new(linear_model(intercept_for(department)), identity_scaler())
}

pub fn full_registry() -> ModelRegistry {
    ModelRegistry::from_bundles(Department::ALL.map(|d| (d, bundle_for(d))))
}

pub fn registry_without(missing: Department) -> ModelRegistry {
    ModelRegistry::from_bundles(
        Department::ALL
            .into_iter()
            .filter(|&d| d != missing)
            .map(|d| (d, bundle_for(d))),
    )
}

/// A regressor that always errors.
#[derive(Debug)]
pub struct FailingRegressor;

impl Regressor for FailingRegressor {
    fn predict(&self, _features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError> {
        Err(ArtifactError::Malformed("boom".to_string()))
    }
}

/// A regressor that returns NaN for every row.
#[derive(Debug)]
pub struct NanRegressor;

impl Regressor for NanRegressor {
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, ArtifactError> {
        Ok(DVector::from_element(features.nrows(), f64::NAN))
    }
}
