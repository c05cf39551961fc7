//! Statistics over an expiry sweep.

use serde::Serialize;

use crate::domain::PredictionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Decreasing,
    Increasing,
}

/// Mean/min/max over the available prices of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub points: usize,
    pub unavailable: usize,
    pub mean_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price_range: f64,
    pub trend: PriceTrend,
}

/// Summarize a sweep; `None` when no row has a price.
///
/// Trend compares the first and last available prices in sweep order; a flat
/// sweep reports `increasing`.
pub fn summarize_sweep(results: &[PredictionResult]) -> Option<SweepSummary> {
    let prices: Vec<f64> = results.iter().filter_map(PredictionResult::price).collect();
    let (&first, &last) = (prices.first()?, prices.last()?);

    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_price = prices.iter().sum::<f64>() / prices.len() as f64;

    Some(SweepSummary {
        points: prices.len(),
        unavailable: results.len() - prices.len(),
        mean_price,
        min_price,
        max_price,
        price_range: max_price - min_price,
        trend: if last < first {
            PriceTrend::Decreasing
        } else {
            PriceTrend::Increasing
        },
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Department;
    use crate::error::RowFailure;

    fn row(days: u32, price: Option<f64>) -> PredictionResult {
        PredictionResult {
            dept_id: Department::Foods1,
            days_to_expiry: days,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            city: None,
            predicted_price: price.ok_or(RowFailure::ModelUnavailable {
                department: Department::Foods1,
            }),
        }
    }

    #[test]
    fn stats_skip_unavailable_rows() {
        let results = vec![row(1, Some(4.0)), row(2, None), row(3, Some(2.0)), row(4, Some(3.0))];
        let s = summarize_sweep(&results).unwrap();
        assert_eq!(s.points, 3);
        assert_eq!(s.unavailable, 1);
        assert!((s.mean_price - 3.0).abs() < 1e-12);
        assert_eq!(s.min_price, 2.0);
        assert_eq!(s.max_price, 4.0);
        assert_eq!(s.price_range, 2.0);
        assert_eq!(s.trend, PriceTrend::Decreasing);
    }

    #[test]
    fn rising_prices_are_increasing() {
        let s = summarize_sweep(&[row(1, Some(1.0)), row(2, Some(1.5))]).unwrap();
        assert_eq!(s.trend, PriceTrend::Increasing);
    }

    #[test]
    fn no_prices_no_summary() {
        assert!(summarize_sweep(&[]).is_none());
        assert!(summarize_sweep(&[row(1, None), row(2, None)]).is_none());
    }
}
