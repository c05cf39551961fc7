//! Export prediction results to CSV or JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets; unavailable rows
//! have an empty `predicted_price` and `status=unavailable`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::PredictionResult;
use crate::error::{AppError, EXIT_IO};

/// Envelope for JSON exports and `--json` output.
#[derive(Debug, Serialize)]
pub struct PredictionBatch<'a> {
    pub predictions: &'a [PredictionResult],
    pub total_items: usize,
}

impl<'a> PredictionBatch<'a> {
    pub fn new(predictions: &'a [PredictionResult]) -> Self {
        Self {
            predictions,
            total_items: predictions.len(),
        }
    }
}

/// Write per-row results to a CSV file.
pub fn write_results_csv(path: &Path, results: &[PredictionResult]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_csv(BufWriter::new(file), results)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write export CSV: {e}")))
}

fn write_csv<W: Write>(mut out: W, results: &[PredictionResult]) -> std::io::Result<()> {
    writeln!(out, "dept_id,days_to_expiry,date,city,predicted_price,status")?;
    for r in results {
        let (price, status) = match r.price() {
            Some(p) => (format!("{p:.4}"), "ok"),
            None => (String::new(), "unavailable"),
        };
        writeln!(
            out,
            "{},{},{},{},{},{}",
            r.dept_id,
            r.days_to_expiry,
            r.date,
            csv_field(r.city.as_deref().unwrap_or("")),
            price,
            status
        )?;
    }
    out.flush()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write per-row results to a JSON file.
pub fn write_results_json(path: &Path, results: &[PredictionResult]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &PredictionBatch::new(results))
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to write export JSON: {e}")))
}
