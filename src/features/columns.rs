//! The feature column contract.
//!
//! Scalers and models are fitted on exactly `MODEL_COLUMNS`, in this order.
//! Reordering, adding or removing a column silently corrupts predictions, so any
//! change here must bump `FEATURE_SCHEMA_VERSION` and ship re-fitted artifacts.

use crate::domain::{AuxSignal, Department};

/// Version of the column layout below.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// One column of the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    DaysToExpiry,
    DaysToExpirySquared,
    DaysToExpiryCubed,
    LogDaysToExpiry,
    DayOfWeek,
    WeekOfYear,
    Month,
    Aux(AuxSignal),
    Dept(Department),
}

use FeatureColumn::{Aux, Dept};

/// Full model input, in fitted order.
pub const MODEL_COLUMNS: [FeatureColumn; 24] = [
    FeatureColumn::DaysToExpiry,
    FeatureColumn::DaysToExpirySquared,
    FeatureColumn::DaysToExpiryCubed,
    FeatureColumn::LogDaysToExpiry,
    Aux(AuxSignal::DaysSinceFirstSale),
    FeatureColumn::DayOfWeek,
    FeatureColumn::WeekOfYear,
    FeatureColumn::Month,
    Aux(AuxSignal::HasEvent),
    Aux(AuxSignal::PromoImpact),
    Aux(AuxSignal::PriceDiff),
    Aux(AuxSignal::PriceTrend),
    Aux(AuxSignal::PriceElasticity),
    Aux(AuxSignal::SalesLag1),
    Aux(AuxSignal::StockTurnover),
    Aux(AuxSignal::ExpiryPriceElasticity),
    Aux(AuxSignal::DaysToExpiryPriceElasticity),
    Aux(AuxSignal::DaysToExpiryPriceTrend),
    Aux(AuxSignal::PriceElasticityTrendInteraction),
    Aux(AuxSignal::SellPriceLag7),
    Aux(AuxSignal::DaysToExpirySalesInteraction),
    Dept(Department::Foods1),
    Dept(Department::Foods2),
    Dept(Department::Foods3),
];

/// Columns passed through the scaler, in the scaler's fitted order.
///
/// Calendar fields, `has_event`, `promo_impact` and the one-hot block are fed
/// to the model unscaled.
pub const SCALED_COLUMNS: [FeatureColumn; 16] = [
    FeatureColumn::DaysToExpiry,
    FeatureColumn::DaysToExpirySquared,
    FeatureColumn::DaysToExpiryCubed,
    FeatureColumn::LogDaysToExpiry,
    Aux(AuxSignal::DaysSinceFirstSale),
    Aux(AuxSignal::PriceDiff),
    Aux(AuxSignal::PriceTrend),
    Aux(AuxSignal::PriceElasticity),
    Aux(AuxSignal::SalesLag1),
    Aux(AuxSignal::StockTurnover),
    Aux(AuxSignal::ExpiryPriceElasticity),
    Aux(AuxSignal::DaysToExpiryPriceElasticity),
    Aux(AuxSignal::DaysToExpiryPriceTrend),
    Aux(AuxSignal::PriceElasticityTrendInteraction),
    Aux(AuxSignal::SellPriceLag7),
    Aux(AuxSignal::DaysToExpirySalesInteraction),
];

impl FeatureColumn {
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::DaysToExpiry => "days_to_expiry",
            FeatureColumn::DaysToExpirySquared => "days_to_expiry_squared",
            FeatureColumn::DaysToExpiryCubed => "days_to_expiry_cubed",
            FeatureColumn::LogDaysToExpiry => "log_days_to_expiry",
            FeatureColumn::DayOfWeek => "day_of_week",
            FeatureColumn::WeekOfYear => "week_of_year",
            FeatureColumn::Month => "month",
            Aux(signal) => signal.name(),
            Dept(Department::Foods1) => "dept_FOODS_1",
            Dept(Department::Foods2) => "dept_FOODS_2",
            Dept(Department::Foods3) => "dept_FOODS_3",
        }
    }
}

/// Column names of `MODEL_COLUMNS`.
pub fn model_column_names() -> Vec<&'static str> {
    MODEL_COLUMNS.iter().map(|c| c.name()).collect()
}

/// Column names of `SCALED_COLUMNS`.
pub fn scaled_column_names() -> Vec<&'static str> {
    SCALED_COLUMNS.iter().map(|c| c.name()).collect()
}

/// Position of a column in `MODEL_COLUMNS`.
pub fn column_index(column: FeatureColumn) -> Option<usize> {
    MODEL_COLUMNS.iter().position(|&c| c == column)
}

/// Positions of each `SCALED_COLUMNS` entry inside `MODEL_COLUMNS`.
pub fn scaled_indices() -> Vec<usize> {
    SCALED_COLUMNS
        .iter()
        .filter_map(|&c| column_index(c))
        .collect()
}
