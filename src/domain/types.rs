//! Shared domain types.
//!
//! Requests arrive loosely typed (`RawRecord`, `ListingRequest`) and are only
//! trusted after batch validation in `features::builder`. Results
//! (`PredictionResult`, `ModelInfo`, `HealthReport`) are serializable so the
//! CLI can print them as tables or JSON.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{BundleLoadError, PredictError, RowFailure};

/// Product department. This is a closed set: one-hot encoding and model
/// selection both depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    /// Fresh dairy (paneer, yogurt, cheese, butter).
    #[serde(rename = "FOODS_1")]
    Foods1,
    /// Bakery (cake, bread, pastries, rolls).
    #[serde(rename = "FOODS_2")]
    Foods2,
    /// Seafood (shrimp, salmon, fish, crab).
    #[serde(rename = "FOODS_3")]
    Foods3,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Foods1, Department::Foods2, Department::Foods3];

    pub fn code(self) -> &'static str {
        match self {
            Department::Foods1 => "FOODS_1",
            Department::Foods2 => "FOODS_2",
            Department::Foods3 => "FOODS_3",
        }
    }

    /// Exact-match lookup by department code (case-sensitive, like the model files).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|d| d.code()).collect()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| format!("unknown department '{s}'"))
    }
}

/// Auxiliary real-time signals a caller may supply.
///
/// None of these are known at request time in the usual flow, so they default
/// to `0.0` and the model degrades to an expiry-and-calendar signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxSignal {
    DaysSinceFirstSale,
    HasEvent,
    PromoImpact,
    PriceDiff,
    PriceTrend,
    PriceElasticity,
    SalesLag1,
    StockTurnover,
    ExpiryPriceElasticity,
    DaysToExpiryPriceElasticity,
    DaysToExpiryPriceTrend,
    PriceElasticityTrendInteraction,
    SellPriceLag7,
    DaysToExpirySalesInteraction,
}

impl AuxSignal {
    pub const ALL: [AuxSignal; 14] = [
        AuxSignal::DaysSinceFirstSale,
        AuxSignal::HasEvent,
        AuxSignal::PromoImpact,
        AuxSignal::PriceDiff,
        AuxSignal::PriceTrend,
        AuxSignal::PriceElasticity,
        AuxSignal::SalesLag1,
        AuxSignal::StockTurnover,
        AuxSignal::ExpiryPriceElasticity,
        AuxSignal::DaysToExpiryPriceElasticity,
        AuxSignal::DaysToExpiryPriceTrend,
        AuxSignal::PriceElasticityTrendInteraction,
        AuxSignal::SellPriceLag7,
        AuxSignal::DaysToExpirySalesInteraction,
    ];

    /// Column name, also the override key accepted in `additional_features`.
    pub fn name(self) -> &'static str {
        match self {
            AuxSignal::DaysSinceFirstSale => "days_since_first_sale",
            AuxSignal::HasEvent => "has_event",
            AuxSignal::PromoImpact => "promo_impact",
            AuxSignal::PriceDiff => "price_diff",
            AuxSignal::PriceTrend => "price_trend",
            AuxSignal::PriceElasticity => "price_elasticity",
            AuxSignal::SalesLag1 => "sales_lag_1",
            AuxSignal::StockTurnover => "stock_turnover",
            AuxSignal::ExpiryPriceElasticity => "expiry_price_elasticity",
            AuxSignal::DaysToExpiryPriceElasticity => "days_to_expiry_price_elasticity",
            AuxSignal::DaysToExpiryPriceTrend => "days_to_expiry_price_trend",
            AuxSignal::PriceElasticityTrendInteraction => "price_elasticity_trend_interaction",
            AuxSignal::SellPriceLag7 => "sell_price_lag_7",
            AuxSignal::DaysToExpirySalesInteraction => "days_to_expiry_sales_interaction",
        }
    }
}

impl FromStr for AuxSignal {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|sig| sig.name() == key)
            .ok_or_else(|| PredictError::UnknownOverride {
                key: key.to_string(),
            })
    }
}

/// Caller-supplied overrides for the auxiliary signals.
///
/// Every field defaults to `0.0`; omitting a field and sending `0.0` are
/// indistinguishable. Unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureOverrides {
    pub days_since_first_sale: f64,
    pub has_event: f64,
    pub promo_impact: f64,
    pub price_diff: f64,
    pub price_trend: f64,
    pub price_elasticity: f64,
    pub sales_lag_1: f64,
    pub stock_turnover: f64,
    pub expiry_price_elasticity: f64,
    pub days_to_expiry_price_elasticity: f64,
    pub days_to_expiry_price_trend: f64,
    pub price_elasticity_trend_interaction: f64,
    pub sell_price_lag_7: f64,
    pub days_to_expiry_sales_interaction: f64,
}

impl FeatureOverrides {
    pub fn get(&self, signal: AuxSignal) -> f64 {
        *self.slot(signal)
    }

    pub fn set(&mut self, signal: AuxSignal, value: f64) {
        *self.slot_mut(signal) = value;
    }

    /// Parse a `key=value` pair (as given to `xp predict --set`).
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), PredictError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| PredictError::UnknownOverride {
                key: assignment.to_string(),
            })?;
        let signal: AuxSignal = key.parse()?;
        let invalid = || PredictError::InvalidOverrideValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let parsed: f64 = value.trim().parse().map_err(|_| invalid())?;
        if !parsed.is_finite() {
            return Err(invalid());
        }
        self.set(signal, parsed);
        Ok(())
    }

    fn slot(&self, signal: AuxSignal) -> &f64 {
        match signal {
            AuxSignal::DaysSinceFirstSale => &self.days_since_first_sale,
            AuxSignal::HasEvent => &self.has_event,
            AuxSignal::PromoImpact => &self.promo_impact,
            AuxSignal::PriceDiff => &self.price_diff,
            AuxSignal::PriceTrend => &self.price_trend,
            AuxSignal::PriceElasticity => &self.price_elasticity,
            AuxSignal::SalesLag1 => &self.sales_lag_1,
            AuxSignal::StockTurnover => &self.stock_turnover,
            AuxSignal::ExpiryPriceElasticity => &self.expiry_price_elasticity,
            AuxSignal::DaysToExpiryPriceElasticity => &self.days_to_expiry_price_elasticity,
            AuxSignal::DaysToExpiryPriceTrend => &self.days_to_expiry_price_trend,
            AuxSignal::PriceElasticityTrendInteraction => &self.price_elasticity_trend_interaction,
            AuxSignal::SellPriceLag7 => &self.sell_price_lag_7,
            AuxSignal::DaysToExpirySalesInteraction => &self.days_to_expiry_sales_interaction,
        }
    }

    fn slot_mut(&mut self, signal: AuxSignal) -> &mut f64 {
        match signal {
            AuxSignal::DaysSinceFirstSale => &mut self.days_since_first_sale,
            AuxSignal::HasEvent => &mut self.has_event,
            AuxSignal::PromoImpact => &mut self.promo_impact,
            AuxSignal::PriceDiff => &mut self.price_diff,
            AuxSignal::PriceTrend => &mut self.price_trend,
            AuxSignal::PriceElasticity => &mut self.price_elasticity,
            AuxSignal::SalesLag1 => &mut self.sales_lag_1,
            AuxSignal::StockTurnover => &mut self.stock_turnover,
            AuxSignal::ExpiryPriceElasticity => &mut self.expiry_price_elasticity,
            AuxSignal::DaysToExpiryPriceElasticity => &mut self.days_to_expiry_price_elasticity,
            AuxSignal::DaysToExpiryPriceTrend => &mut self.days_to_expiry_price_trend,
            AuxSignal::PriceElasticityTrendInteraction => {
                &mut self.price_elasticity_trend_interaction
            }
            AuxSignal::SellPriceLag7 => &mut self.sell_price_lag_7,
            AuxSignal::DaysToExpirySalesInteraction => &mut self.days_to_expiry_sales_interaction,
        }
    }
}

/// A caller-supplied item, as received.
///
/// Required fields are `Option` here on purpose: presence is checked for the
/// whole batch at once by `features::validate_records`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub days_to_expiry: Option<i64>,
    #[serde(default)]
    pub dept_id: Option<String>,
    /// ISO-8601 date or date-time.
    #[serde(default)]
    pub date: Option<String>,
    /// Echoed back in the result; never a model input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, rename = "additional_features")]
    pub overrides: FeatureOverrides,
}

impl RawRecord {
    pub fn new(days_to_expiry: i64, dept_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            days_to_expiry: Some(days_to_expiry),
            dept_id: Some(dept_id.into()),
            date: Some(date.into()),
            city: None,
            overrides: FeatureOverrides::default(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_overrides(mut self, overrides: FeatureOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Fill an absent `date` with `today`.
    pub fn or_date(mut self, today: NaiveDate) -> Self {
        if self.date.is_none() {
            self.date = Some(today.format("%Y-%m-%d").to_string());
        }
        self
    }
}

/// One priced (or unpriceable) row, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub dept_id: Department,
    pub days_to_expiry: u32,
    pub date: NaiveDate,
    pub city: Option<String>,
    /// Either a finite price or the reason there is none. Never a zero stand-in.
    pub predicted_price: Result<f64, RowFailure>,
}

impl PredictionResult {
    pub fn price(&self) -> Option<f64> {
        self.predicted_price.as_ref().ok().copied()
    }

    pub fn is_available(&self) -> bool {
        self.predicted_price.is_ok()
    }
}

/// Wire shape of a `PredictionResult`: `predicted_price` is a number or `null`.
#[derive(Serialize)]
struct PredictionRecord<'a> {
    dept_id: Department,
    days_to_expiry: u32,
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<&'a str>,
    predicted_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unavailable_reason: Option<String>,
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PredictionRecord {
            dept_id: self.dept_id,
            days_to_expiry: self.days_to_expiry,
            date: self.date,
            city: self.city.as_deref(),
            predicted_price: self.price(),
            unavailable_reason: self.predicted_price.as_ref().err().map(|e| e.to_string()),
        }
        .serialize(serializer)
    }
}

/// Registry snapshot for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub loaded_models: Vec<Department>,
    pub model_count: usize,
    pub scaler_count: usize,
    pub supported_departments: Vec<Department>,
    pub feature_schema_version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every supported department has a bundle.
    Healthy,
    /// Some departments are missing a bundle.
    Degraded,
    /// No bundle loaded at all.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub models_loaded: usize,
    pub failed: Vec<BundleLoadError>,
}

/// A marketplace listing as submitted by the grocery backend.
///
/// Only `categoryId`, `cityId`, `dateAdded` and `expiryDate` feed the model;
/// the remaining fields are accepted for compatibility and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Priced listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuote {
    pub category_id: String,
    pub dept_id: Department,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,
    pub days_to_expiry: u32,
    pub best_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

/// Resolved runtime configuration for a CLI invocation.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub model_dir: PathBuf,
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_codes_round_trip() {
        for dept in Department::ALL {
            assert_eq!(Department::from_code(dept.code()), Some(dept));
            assert_eq!(dept.to_string().parse::<Department>(), Ok(dept));
        }
        assert_eq!(Department::from_code("FOODS_9"), None);
        assert_eq!(Department::from_code("foods_1"), None);
    }

    #[test]
    fn overrides_default_to_zero_and_reject_unknown_keys() {
        let parsed: FeatureOverrides = serde_json::from_str(r#"{"promo_impact": 0.1}"#).unwrap();
        assert_eq!(parsed.get(AuxSignal::PromoImpact), 0.1);
        for sig in AuxSignal::ALL {
            if sig != AuxSignal::PromoImpact {
                assert_eq!(parsed.get(sig), 0.0, "{} should default to 0", sig.name());
            }
        }

        let bad = serde_json::from_str::<FeatureOverrides>(r#"{"mrp": 99.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn assignment_parses_known_keys_only() {
        let mut o = FeatureOverrides::default();
        o.apply_assignment("has_event=1").unwrap();
        assert_eq!(o.has_event, 1.0);

        assert!(matches!(
            o.apply_assignment("city=CA_1"),
            Err(PredictError::UnknownOverride { .. })
        ));
        assert!(o.apply_assignment("promo_impact").is_err());
        assert!(matches!(
            o.apply_assignment("promo_impact=abc"),
            Err(PredictError::InvalidOverrideValue { .. })
        ));
    }

    #[test]
    fn assignment_rejects_non_finite_values() {
        let mut o = FeatureOverrides::default();
        for raw in ["promo_impact=NaN", "promo_impact=inf", "price_trend=-infinity"] {
            assert!(
                matches!(o.apply_assignment(raw), Err(PredictError::InvalidOverrideValue { .. })),
                "accepted {raw}"
            );
        }
        assert_eq!(o, FeatureOverrides::default());
    }

    #[test]
    fn raw_record_parses_source_payload() {
        let json = r#"{
            "days_to_expiry": 5,
            "dept_id": "FOODS_1",
            "date": "2024-01-15",
            "city": "CA_1",
            "additional_features": {"has_event": 0, "promo_impact": 0.1}
        }"#;
        let rec: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.days_to_expiry, Some(5));
        assert_eq!(rec.city.as_deref(), Some("CA_1"));
        assert_eq!(rec.overrides.promo_impact, 0.1);
    }

    #[test]
    fn or_date_only_fills_missing_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rec = RawRecord {
            days_to_expiry: Some(1),
            dept_id: Some("FOODS_2".into()),
            ..RawRecord::default()
        }
        .or_date(today);
        assert_eq!(rec.date.as_deref(), Some("2024-03-01"));

        let kept = RawRecord::new(1, "FOODS_2", "2024-01-15").or_date(today);
        assert_eq!(kept.date.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn unavailable_price_serializes_as_null() {
        let result = PredictionResult {
            dept_id: Department::Foods2,
            days_to_expiry: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            city: None,
            predicted_price: Err(RowFailure::ModelUnavailable {
                department: Department::Foods2,
            }),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert!(v["predicted_price"].is_null());
        assert_eq!(v["dept_id"], "FOODS_2");
        assert_eq!(v["date"], "2024-01-15");
        assert!(v.get("city").is_none());
        assert!(v["unavailable_reason"].as_str().unwrap().contains("FOODS_2"));
    }
}
