//! Terminal formatting for prediction results and registry status.
//!
//! Everything here builds a `String`; printing is left to `app`.

use crate::domain::{Department, HealthReport, HealthStatus, ListingQuote, ModelInfo, PredictionResult};
use crate::report::summary::{PriceTrend, SweepSummary};

/// Per-row prediction table, in input order.
pub fn format_predictions(results: &[PredictionResult]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<8} {:>6} {:<10} {:<12} {:>12} {:<12}",
            "dept", "days", "date", "city", "price", "status"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<8} {:-<6} {:-<10} {:-<12} {:-<12} {:-<12}", "", "", "", "", "", ""),
    );

    for r in results {
        let (price, status) = match r.price() {
            Some(p) => (format!("{p:.4}"), "ok"),
            None => ("-".to_string(), "unavailable"),
        };
        push_line(
            &mut out,
            format!(
                "{:<8} {:>6} {:<10} {:<12} {:>12} {:<12}",
                r.dept_id.code(),
                r.days_to_expiry,
                r.date,
                truncate(r.city.as_deref().unwrap_or(""), 12),
                price,
                status
            ),
        );
    }

    let available = results.iter().filter(|r| r.is_available()).count();
    out.push_str(&format!("\n{available}/{} rows priced\n", results.len()));

    for r in results {
        if let Err(reason) = &r.predicted_price {
            out.push_str(&format!("  ({} d={}) {reason}\n", r.dept_id, r.days_to_expiry));
        }
    }
    out
}

pub fn format_sweep_summary(summary: Option<&SweepSummary>) -> String {
    let Some(s) = summary else {
        return "Sweep: no prices available.\n".to_string();
    };
    let trend = match s.trend {
        PriceTrend::Decreasing => "decreasing",
        PriceTrend::Increasing => "increasing",
    };
    let mut out = String::new();
    out.push_str(&format!(
        "Sweep: n={} (unavailable={}) | trend={trend}\n",
        s.points, s.unavailable
    ));
    out.push_str(&format!(
        "Price: mean={:.4} min={:.4} max={:.4} range={:.4}\n",
        s.mean_price, s.min_price, s.max_price, s.price_range
    ));
    out
}

pub fn format_model_info(info: &ModelInfo) -> String {
    let mut out = String::new();
    out.push_str("=== xp - expiry pricing models ===\n");
    out.push_str(&format!(
        "Loaded: {} model(s), {} scaler(s)\n",
        info.model_count, info.scaler_count
    ));
    out.push_str(&format!("Departments: {}\n", join_codes(&info.loaded_models)));
    out.push_str(&format!("Supported: {}\n", join_codes(&info.supported_departments)));
    out.push_str(&format!("Feature schema: v{}\n", info.feature_schema_version));
    out
}

pub fn format_health(report: &HealthReport) -> String {
    let status = match report.status {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded => "degraded",
        HealthStatus::Unavailable => "unavailable",
    };
    let mut out = format!("Status: {status} ({} model(s) loaded)\n", report.models_loaded);
    for failure in &report.failed {
        out.push_str(&format!("  - {failure}\n"));
    }
    out
}

pub fn format_quote(quote: &ListingQuote) -> String {
    let mut out = String::new();
    out.push_str(&format!("Category: {} ({})\n", quote.category_id, quote.dept_id));
    if let Some(city) = &quote.city_id {
        out.push_str(&format!("City: {city}\n"));
    }
    out.push_str(&format!("Days to expiry: {}\n", quote.days_to_expiry));
    match (quote.best_price, &quote.unavailable_reason) {
        (Some(p), _) => out.push_str(&format!("Best price: {p:.4}\n")),
        (None, Some(reason)) => out.push_str(&format!("Best price: unavailable ({reason})\n")),
        (None, None) => out.push_str("Best price: unavailable\n"),
    }
    out
}

fn join_codes(departments: &[Department]) -> String {
    if departments.is_empty() {
        return "(none)".to_string();
    }
    departments.iter().map(|d| d.code()).collect::<Vec<_>>().join(", ")
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::{BundleLoadError, RowFailure};

    #[test]
    fn table_marks_missing_prices() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let results = vec![
            PredictionResult {
                dept_id: Department::Foods1,
                days_to_expiry: 5,
                date,
                city: Some("CA_1".into()),
                predicted_price: Ok(12.5),
            },
            PredictionResult {
                dept_id: Department::Foods2,
                days_to_expiry: 3,
                date,
                city: None,
                predicted_price: Err(RowFailure::ModelUnavailable {
                    department: Department::Foods2,
                }),
            },
        ];
        let txt = format_predictions(&results);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[0].starts_with("dept"));
        assert!(lines[2].contains("12.5000") && lines[2].ends_with("ok"));
        assert!(lines[3].ends_with("unavailable"));
        assert!(txt.contains("1/2 rows priced"));
        assert!(txt.contains("no model bundle loaded for FOODS_2"));
    }

    #[test]
    fn health_lists_failures() {
        let report = HealthReport {
            status: HealthStatus::Degraded,
            models_loaded: 2,
            failed: vec![BundleLoadError {
                department: Department::Foods3,
                reason: "not loaded".into(),
            }],
        };
        let txt = format_health(&report);
        assert!(txt.starts_with("Status: degraded (2 model(s) loaded)"));
        assert!(txt.contains("FOODS_3: not loaded"));
    }

    #[test]
    fn empty_sweep_summary() {
        assert_eq!(format_sweep_summary(None), "Sweep: no prices available.\n");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Springfield-Downtown", 8), "Springf.");
        assert_eq!(truncate("CA_1", 8), "CA_1");
    }
}
