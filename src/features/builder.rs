//! Feature construction: raw records -> fixed-width numeric matrix.
//!
//! The pipeline is two steps, both batch-wide:
//!
//! 1. `validate_records`: reject the whole batch if any record is missing a
//!    required field, names an unknown department, has a negative expiry, or
//!    carries an unparseable date
//! 2. `build_features`: turn each validated row into a `MODEL_COLUMNS` vector
//!
//! City is kept as per-row metadata only. Models were never fitted with a city
//! signal, so it must not become a column.

use chrono::NaiveDate;
use nalgebra::{DMatrix, RowDVector};
use tracing::debug;

use crate::domain::{Department, FeatureOverrides, RawRecord};
use crate::error::PredictError;
use crate::features::calendar::{CalendarFields, parse_date};
use crate::features::columns::{FeatureColumn, MODEL_COLUMNS};

/// Validated, typed view of one input record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMeta {
    pub department: Department,
    pub days_to_expiry: u32,
    pub date: NaiveDate,
    pub calendar: CalendarFields,
    pub city: Option<String>,
    pub overrides: FeatureOverrides,
}

/// Feature matrix plus per-row bookkeeping, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: DMatrix<f64>,
    rows: Vec<RowMeta>,
}

impl FeatureMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `n x MODEL_COLUMNS.len()` numeric matrix.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn rows(&self) -> &[RowMeta] {
        &self.rows
    }

    /// A single row as a `1 x MODEL_COLUMNS.len()` matrix.
    pub fn row_matrix(&self, row: usize) -> Option<DMatrix<f64>> {
        (row < self.values.nrows()).then(|| self.values.rows(row, 1).into_owned())
    }
}

/// Check the batch and resolve each record into typed row metadata.
pub fn validate_records(records: &[RawRecord]) -> Result<Vec<RowMeta>, PredictError> {
    // Presence first, across the whole batch, so one good record can't mask a
    // malformed sibling.
    let mut missing_fields: Vec<&'static str> = Vec::new();
    let mut missing_rows = Vec::new();
    for (idx, rec) in records.iter().enumerate() {
        let mut row_missing = false;
        for (field, present) in [
            ("days_to_expiry", rec.days_to_expiry.is_some()),
            ("dept_id", rec.dept_id.is_some()),
            ("date", rec.date.is_some()),
        ] {
            if !present {
                row_missing = true;
                if !missing_fields.contains(&field) {
                    missing_fields.push(field);
                }
            }
        }
        if row_missing {
            missing_rows.push(idx);
        }
    }
    if !missing_fields.is_empty() {
        return Err(PredictError::MissingField {
            fields: missing_fields,
            rows: missing_rows,
        });
    }

    records
        .iter()
        .enumerate()
        .map(|(idx, rec)| resolve_row(idx, rec))
        .collect()
}

fn resolve_row(row: usize, rec: &RawRecord) -> Result<RowMeta, PredictError> {
    let dept_raw = rec.dept_id.as_deref().unwrap_or_default();
    let department = Department::from_code(dept_raw).ok_or_else(|| PredictError::InvalidDepartment {
        row,
        value: dept_raw.to_string(),
    })?;

    let days_raw = rec.days_to_expiry.unwrap_or_default();
    let days_to_expiry = u32::try_from(days_raw)
        .map_err(|_| PredictError::InvalidDaysToExpiry { row, value: days_raw })?;

    let date_raw = rec.date.as_deref().unwrap_or_default();
    let date = parse_date(date_raw).ok_or_else(|| PredictError::InvalidDate {
        row,
        value: date_raw.to_string(),
    })?;

    Ok(RowMeta {
        department,
        days_to_expiry,
        date,
        calendar: CalendarFields::from_date(date),
        city: rec.city.clone(),
        overrides: rec.overrides,
    })
}

/// Compute the `MODEL_COLUMNS` vector for one validated row.
pub fn feature_row(meta: &RowMeta) -> RowDVector<f64> {
    let days = f64::from(meta.days_to_expiry);
    RowDVector::from_iterator(
        MODEL_COLUMNS.len(),
        MODEL_COLUMNS.iter().map(|col| match *col {
            FeatureColumn::DaysToExpiry => days,
            FeatureColumn::DaysToExpirySquared => days.powi(2),
            FeatureColumn::DaysToExpiryCubed => days.powi(3),
            FeatureColumn::LogDaysToExpiry => days.ln_1p(),
            FeatureColumn::DayOfWeek => f64::from(meta.calendar.day_of_week),
            FeatureColumn::WeekOfYear => f64::from(meta.calendar.week_of_year),
            FeatureColumn::Month => f64::from(meta.calendar.month),
            FeatureColumn::Aux(signal) => meta.overrides.get(signal),
            FeatureColumn::Dept(dept) => {
                if dept == meta.department {
                    1.0
                } else {
                    0.0
                }
            }
        }),
    )
}

/// Validate a batch and build its feature matrix.
pub fn build_features(records: &[RawRecord]) -> Result<FeatureMatrix, PredictError> {
    let rows = validate_records(records)?;

    let mut values = DMatrix::zeros(rows.len(), MODEL_COLUMNS.len());
    for (i, meta) in rows.iter().enumerate() {
        values.set_row(i, &feature_row(meta));
    }

    debug!(
        rows = rows.len(),
        columns = MODEL_COLUMNS.len(),
        "built feature matrix"
    );

    Ok(FeatureMatrix { values, rows })
}
