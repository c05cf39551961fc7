//! Error types.
//!
//! Three layers, from innermost to outermost:
//!
//! - `RowFailure`: a single row could not be priced (batch continues)
//! - `PredictError`: the request is malformed and is rejected as a whole
//! - `AppError`: what the `xp` binary reports, with a process exit code
//!
//! `BundleLoadError` sits beside these: it is collected at startup and never
//! stops the registry from being built.

use serde::Serialize;
use thiserror::Error;

use crate::domain::Department;

/// Exit code for caller-correctable input errors.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when no model bundle could be loaded and the caller asked to fail on it.
pub const EXIT_UNAVAILABLE: u8 = 3;
/// Exit code for file I/O and artifact read failures.
pub const EXIT_IO: u8 = 4;

/// Batch-level validation errors. Any of these rejects the whole request
/// before features are built or a model is invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Missing required field(s) {fields:?} (rows {rows:?}).")]
    MissingField {
        fields: Vec<&'static str>,
        rows: Vec<usize>,
    },

    #[error("Row {row}: invalid department '{value}'. Must be one of: {}.", Department::names().join(", "))]
    InvalidDepartment { row: usize, value: String },

    #[error("Row {row}: invalid date '{value}' (expected ISO-8601, e.g. 2024-01-15).")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: days_to_expiry must be between 0 and {}, got {value}.", u32::MAX)]
    InvalidDaysToExpiry { row: usize, value: i64 },

    #[error("Unknown feature override '{key}'.")]
    UnknownOverride { key: String },

    #[error("Feature override '{key}' needs a finite number, got '{value}'.")]
    InvalidOverrideValue { key: String, value: String },

    #[error("max_days must be at most {limit}, got {value}.")]
    SweepTooLong { value: u32, limit: u32 },
}

/// Why a single row has no price.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowFailure {
    #[error("no model bundle loaded for {department}")]
    ModelUnavailable { department: Department },

    #[error("inference failed for {department}: {message}")]
    Inference {
        department: Department,
        message: String,
    },
}

/// A department whose model/scaler pair could not be loaded.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{department}: {reason}")]
pub struct BundleLoadError {
    pub department: Department,
    pub reason: String,
}

/// Failure inside a model or scaler invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("expected {expected} input columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("feature names do not match the column contract: {0}")]
    ColumnMismatch(String),

    #[error("malformed artifact: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        AppError::new(EXIT_INPUT, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
