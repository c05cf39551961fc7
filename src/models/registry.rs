//! Per-department model registry.
//!
//! Built once at startup and read-only afterwards; the predictor borrows it.
//! Loading never fails as a whole: a department whose artifacts are missing or
//! inconsistent is recorded in `failures` and simply has no bundle, so health
//! checks can say exactly which departments are broken.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{Department, HealthReport, HealthStatus, ModelInfo};
use crate::error::BundleLoadError;
use crate::features::columns::{FEATURE_SCHEMA_VERSION, model_column_names, scaled_column_names};
use crate::models::artifact::{
    Regressor, Scaler, check_feature_names, read_model_json, read_scaler_json,
};

/// A department's fitted (model, scaler) pair.
#[derive(Debug)]
pub struct ModelBundle {
    model: Box<dyn Regressor>,
    scaler: Box<dyn Scaler>,
}

impl ModelBundle {
    pub fn new(model: impl Regressor + 'static, scaler: impl Scaler + 'static) -> Self {
        Self {
            model: Box::new(model),
            scaler: Box::new(scaler),
        }
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }
}

/// Immutable mapping from department to bundle.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    bundles: BTreeMap<Department, ModelBundle>,
    failures: Vec<BundleLoadError>,
}

impl ModelRegistry {
    /// A registry with nothing loaded. Every row predicts as unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bundles(bundles: impl IntoIterator<Item = (Department, ModelBundle)>) -> Self {
        Self {
            bundles: bundles.into_iter().collect(),
            failures: Vec::new(),
        }
    }

    /// Load every supported department from `dir`.
    ///
    /// Expects `model_{DEPT}_optimized.json` and `scaler_{DEPT}_optimized.json`.
    pub fn load_dir(dir: &Path) -> Self {
        let mut bundles = BTreeMap::new();
        let mut failures = Vec::new();

        for department in Department::ALL {
            match load_bundle(dir, department) {
                Ok(bundle) => {
                    bundles.insert(department, bundle);
                }
                Err(reason) => {
                    warn!(%department, reason = reason.as_str(), "model bundle not loaded");
                    failures.push(BundleLoadError { department, reason });
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded = bundles.len(),
            failed = failures.len(),
            "model registry ready"
        );

        Self { bundles, failures }
    }

    pub fn bundle(&self, department: Department) -> Option<&ModelBundle> {
        self.bundles.get(&department)
    }

    pub fn loaded_departments(&self) -> Vec<Department> {
        self.bundles.keys().copied().collect()
    }

    pub fn failures(&self) -> &[BundleLoadError] {
        &self.failures
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            loaded_models: self.loaded_departments(),
            model_count: self.bundles.len(),
            scaler_count: self.bundles.len(),
            supported_departments: Department::ALL.to_vec(),
            feature_schema_version: FEATURE_SCHEMA_VERSION,
        }
    }

    pub fn health(&self) -> HealthReport {
        let loaded = self.bundles.len();
        let status = if loaded == 0 {
            HealthStatus::Unavailable
        } else if loaded < Department::ALL.len() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        // Departments that are neither loaded nor recorded as failed (e.g. a
        // registry built from an explicit bundle list) still count as broken.
        let mut failed = self.failures.clone();
        for department in Department::ALL {
            if !self.bundles.contains_key(&department)
                && !failed.iter().any(|f| f.department == department)
            {
                failed.push(BundleLoadError {
                    department,
                    reason: "not loaded".to_string(),
                });
            }
        }

        HealthReport {
            status,
            models_loaded: loaded,
            failed,
        }
    }
}

pub fn model_path(dir: &Path, department: Department) -> PathBuf {
    dir.join(format!("model_{}_optimized.json", department.code()))
}

pub fn scaler_path(dir: &Path, department: Department) -> PathBuf {
    dir.join(format!("scaler_{}_optimized.json", department.code()))
}

fn load_bundle(dir: &Path, department: Department) -> Result<ModelBundle, String> {
    let model = read_model_json(&model_path(dir, department))?;
    check_feature_names(model.feature_names(), &model_column_names())
        .map_err(|e| format!("model: {e}"))?;

    let scaler = read_scaler_json(&scaler_path(dir, department))?;
    check_feature_names(&scaler.feature_names, &scaled_column_names())
        .map_err(|e| format!("scaler: {e}"))?;

    Ok(ModelBundle::new(model, scaler))
}
