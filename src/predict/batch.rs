//! Batch inference.
//!
//! Every entry point funnels into `predict_batch`:
//! - `predict_records`: validate + build features + `predict_batch`
//! - `predict_single`: `predict_records` with one record
//! - `analyze`: synthetic sweep over days-to-expiry, then `predict_records`
//!
//! Per-row failures (no bundle, scaler/model error, non-finite output) become a
//! `RowFailure` on that row only; siblings are unaffected.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use tracing::{debug, error, info, warn};

use crate::domain::{Department, ModelInfo, PredictionResult, RawRecord};
use crate::error::{PredictError, RowFailure};
use crate::features::builder::{FeatureMatrix, RowMeta, build_features};
use crate::features::columns::scaled_indices;
use crate::models::registry::{ModelBundle, ModelRegistry};

/// Default upper bound for `analyze` sweeps.
pub const DEFAULT_SWEEP_DAYS: u32 = 30;
/// Longest sweep `analyze` will build; one synthetic row per day.
pub const MAX_SWEEP_DAYS: u32 = 365;

/// Dispatches rows to their department's bundle.
#[derive(Debug, Clone, Copy)]
pub struct BatchPredictor<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> BatchPredictor<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn info(&self) -> ModelInfo {
        self.registry.info()
    }

    /// Price every row of an already-built feature matrix, in row order.
    pub fn predict_batch(&self, matrix: &FeatureMatrix) -> Vec<PredictionResult> {
        let scaled = scaled_indices();
        let mut unavailable = 0usize;

        let results: Vec<PredictionResult> = matrix
            .rows()
            .iter()
            .enumerate()
            .map(|(i, meta)| {
                let predicted_price = self.predict_row(matrix, i, meta, &scaled);
                if let Err(failure) = &predicted_price {
                    unavailable += 1;
                    match failure {
                        RowFailure::ModelUnavailable { department } => {
                            warn!(row = i, %department, "no model for department");
                        }
                        RowFailure::Inference { department, message } => {
                            error!(row = i, %department, message = message.as_str(), "prediction failed");
                        }
                    }
                }
                PredictionResult {
                    dept_id: meta.department,
                    days_to_expiry: meta.days_to_expiry,
                    date: meta.date,
                    city: meta.city.clone(),
                    predicted_price,
                }
            })
            .collect();

        info!(
            rows = results.len(),
            unavailable,
            "batch prediction complete"
        );
        results
    }

    /// Validate raw records, build features and price them.
    pub fn predict_records(&self, records: &[RawRecord]) -> Result<Vec<PredictionResult>, PredictError> {
        let matrix = build_features(records)?;
        Ok(self.predict_batch(&matrix))
    }

    /// A batch of one.
    pub fn predict_single(&self, record: RawRecord) -> Result<PredictionResult, PredictError> {
        let mut results = self.predict_records(std::slice::from_ref(&record))?;
        // One validated record in, one result out.
        Ok(results.remove(0))
    }

    /// Price the same item for every days-to-expiry value in `1..=max_days`.
    pub fn analyze(
        &self,
        department: Department,
        date: NaiveDate,
        max_days: u32,
    ) -> Result<Vec<PredictionResult>, PredictError> {
        if max_days > MAX_SWEEP_DAYS {
            return Err(PredictError::SweepTooLong {
                value: max_days,
                limit: MAX_SWEEP_DAYS,
            });
        }
        let date = date.format("%Y-%m-%d").to_string();
        let records: Vec<RawRecord> = (1..=i64::from(max_days))
            .map(|days| RawRecord::new(days, department.code(), date.clone()))
            .collect();
        debug!(%department, max_days, "expiry sweep");
        self.predict_records(&records)
    }

    fn predict_row(
        &self,
        matrix: &FeatureMatrix,
        row: usize,
        meta: &RowMeta,
        scaled: &[usize],
    ) -> Result<f64, RowFailure> {
        let department = meta.department;
        let bundle = self
            .registry
            .bundle(department)
            .ok_or(RowFailure::ModelUnavailable { department })?;

        let inference = |message: String| RowFailure::Inference {
            department,
            message,
        };

        let features = matrix
            .row_matrix(row)
            .ok_or_else(|| inference(format!("row {row} out of range")))?;

        price_row(bundle, features, scaled).map_err(inference)
    }
}

/// Scale the numeric subset of one row, splice it back, and run the model.
fn price_row(bundle: &ModelBundle, mut features: DMatrix<f64>, scaled: &[usize]) -> Result<f64, String> {
    let subset = features.select_columns(scaled);
    let transformed = bundle
        .scaler()
        .transform(&subset)
        .map_err(|e| format!("scaler: {e}"))?;
    if transformed.shape() != subset.shape() {
        return Err(format!(
            "scaler returned shape {:?}, expected {:?}",
            transformed.shape(),
            subset.shape()
        ));
    }
    for (j, &col) in scaled.iter().enumerate() {
        features[(0, col)] = transformed[(0, j)];
    }

    let output = bundle
        .model()
        .predict(&features)
        .map_err(|e| format!("model: {e}"))?;
    let price = output
        .iter()
        .next()
        .copied()
        .ok_or_else(|| "model returned no output".to_string())?;

    if !price.is_finite() {
        return Err(format!("model returned non-finite value {price}"));
    }
    Ok(price)
}
