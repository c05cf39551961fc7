//! Date parsing and calendar-derived fields.
//!
//! Accepted inputs (all ISO-8601):
//! - `2024-01-15`
//! - `2024-01-15T10:30:00`, `2024-01-15 10:30`, fractional seconds allowed
//! - any of the above with a trailing `Z`
//! - RFC 3339 with an explicit offset; the local calendar date is kept

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Calendar fields derived from a record date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Monday = 0 .. Sunday = 6.
    pub day_of_week: u32,
    /// ISO-8601 week number (1..=53).
    pub week_of_year: u32,
}

impl CalendarFields {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
            week_of_year: date.iso_week().week(),
        }
    }
}

/// Parse a date or date-time string and return the timestamp.
///
/// Date-only inputs resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    parse_naive(trimmed)
}

/// Parse a date or date-time string as a point in time.
///
/// An explicit offset is kept; inputs without one (date-only, trailing `Z`,
/// bare date-time) are taken as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    parse_naive(trimmed).map(|naive| DateTime::from_naive_utc_and_offset(naive, utc))
}

fn parse_naive(trimmed: &str) -> Option<NaiveDateTime> {
    let naive = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
}

/// Parse a date or date-time string and keep the calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|ts| ts.date())
}
