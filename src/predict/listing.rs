//! Pricing a marketplace listing.
//!
//! The grocery backend submits a listing with a category id (`FOODS_1_001`),
//! the date it was added and its expiry date. This maps it to a `RawRecord`
//! and runs it through the normal single-item path.

use crate::domain::{ListingQuote, ListingRequest, RawRecord};
use crate::error::PredictError;
use crate::features::calendar::parse_instant;
use crate::predict::batch::BatchPredictor;

const SECONDS_PER_DAY: i64 = 86_400;

/// Department code embedded in a category id: its first two `_` segments.
pub fn department_from_category(category_id: &str) -> String {
    category_id
        .split('_')
        .take(2)
        .collect::<Vec<_>>()
        .join("_")
}

/// Convert a listing into a record.
///
/// `days_to_expiry` is the number of whole days from `dateAdded` to
/// `expiryDate`, floored, so an expiry earlier on the same day is `-1`.
/// `date` is `dateAdded`.
pub fn listing_to_record(listing: &ListingRequest) -> Result<RawRecord, PredictError> {
    let mut missing = Vec::new();
    if listing.category_id.trim().is_empty() {
        missing.push("categoryId");
    }
    if listing.date_added.is_none() {
        missing.push("dateAdded");
    }
    if listing.expiry_date.is_none() {
        missing.push("expiryDate");
    }
    if !missing.is_empty() {
        return Err(PredictError::MissingField {
            fields: missing,
            rows: vec![0],
        });
    }

    let added_raw = listing.date_added.as_deref().unwrap_or_default();
    let expiry_raw = listing.expiry_date.as_deref().unwrap_or_default();
    let added = parse_instant(added_raw).ok_or_else(|| PredictError::InvalidDate {
        row: 0,
        value: added_raw.to_string(),
    })?;
    let expiry = parse_instant(expiry_raw).ok_or_else(|| PredictError::InvalidDate {
        row: 0,
        value: expiry_raw.to_string(),
    })?;

    let days = (expiry - added).num_seconds().div_euclid(SECONDS_PER_DAY);
    let mut record = RawRecord::new(
        days,
        department_from_category(&listing.category_id),
        added_raw.to_string(),
    );
    record.city = listing.city_id.clone();
    Ok(record)
}

impl BatchPredictor<'_> {
    /// Price a listing. Non-model fields (`mrp`, `weight`, ...) are ignored.
    pub fn quote_listing(&self, listing: &ListingRequest) -> Result<ListingQuote, PredictError> {
        let record = listing_to_record(listing)?;
        let result = self.predict_single(record)?;
        Ok(ListingQuote {
            category_id: listing.category_id.clone(),
            dept_id: result.dept_id,
            city_id: result.city.clone(),
            days_to_expiry: result.days_to_expiry,
            best_price: result.price(),
            unavailable_reason: result.predicted_price.as_ref().err().map(|e| e.to_string()),
        })
    }
}
