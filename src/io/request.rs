//! JSON request files.
//!
//! Shapes match what the grocery service posts:
//! - single: `{days_to_expiry, dept_id, date?, city?, additional_features?}`
//! - batch: `{"items": [single, ...]}`
//! - analysis: `{dept_id, date?, max_days?}`
//! - listing: `{categoryId, cityId?, dateAdded, expiryDate, ...}`
//!
//! An absent `date` means "today"; that default is applied here, before the
//! feature builder, which always requires a date.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{Department, ListingRequest, RawRecord};
use crate::error::{AppError, EXIT_INPUT, EXIT_IO, PredictError};
use crate::features::calendar::parse_date;
use crate::predict::DEFAULT_SWEEP_DAYS;

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub items: Option<Vec<RawRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub dept_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub max_days: Option<u32>,
}

/// Resolved sweep parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSpec {
    pub department: Department,
    pub date: NaiveDate,
    pub max_days: u32,
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid JSON in '{}': {e}", path.display())))
}

/// Unwrap a batch payload and apply the default date.
pub fn batch_records(request: BatchRequest, today: NaiveDate) -> Result<Vec<RawRecord>, AppError> {
    let items = request
        .items
        .ok_or_else(|| AppError::new(EXIT_INPUT, "No items provided."))?;
    if items.is_empty() {
        return Err(AppError::new(EXIT_INPUT, "Empty items list."));
    }
    Ok(items.into_iter().map(|r| r.or_date(today)).collect())
}

/// Resolve an analysis payload.
pub fn sweep_spec(request: &AnalysisRequest, today: NaiveDate) -> Result<SweepSpec, PredictError> {
    let dept_raw = request.dept_id.as_deref().ok_or(PredictError::MissingField {
        fields: vec!["dept_id"],
        rows: vec![0],
    })?;
    let department = Department::from_code(dept_raw).ok_or_else(|| PredictError::InvalidDepartment {
        row: 0,
        value: dept_raw.to_string(),
    })?;
    let date = match request.date.as_deref() {
        None => today,
        Some(raw) => parse_date(raw).ok_or_else(|| PredictError::InvalidDate {
            row: 0,
            value: raw.to_string(),
        })?,
    };
    Ok(SweepSpec {
        department,
        date,
        max_days: request.max_days.unwrap_or(DEFAULT_SWEEP_DAYS),
    })
}

pub fn load_single(path: &Path, today: NaiveDate) -> Result<RawRecord, AppError> {
    let record: RawRecord = read_json(path)?;
    Ok(record.or_date(today))
}

pub fn load_batch(path: &Path, today: NaiveDate) -> Result<Vec<RawRecord>, AppError> {
    batch_records(read_json(path)?, today)
}

pub fn load_listing(path: &Path) -> Result<ListingRequest, AppError> {
    read_json(path)
}
