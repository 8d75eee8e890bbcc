//! Date range parsing for query parameters
//!
//! Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (UTC). Ranges are
//! half-open: `start <= createdAt < end`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::{AppError, AppResult};

/// Half-open creation-time window; `None` bounds are open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build from optional `startDate` / `endDate` query values
    pub fn parse(start: Option<&str>, end: Option<&str>) -> AppResult<Self> {
        let start = start
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_range_start)
            .transpose()?;
        let end = end
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_range_end)
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end)
            && s >= e
        {
            return Err(AppError::validation("startDate must be before endDate"));
        }
        Ok(Self { start, end })
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {date}")))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Start of day (00:00:00 UTC)
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// End of day as the next day's 00:00:00 UTC; callers use `< end`
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date))
}

/// Inclusive lower bound
pub fn parse_range_start(value: &str) -> AppResult<DateTime<Utc>> {
    match parse_timestamp(value) {
        Some(dt) => Ok(dt),
        None => parse_date(value).map(day_start),
    }
}

/// Exclusive upper bound; a plain date covers the whole day
pub fn parse_range_end(value: &str) -> AppResult<DateTime<Utc>> {
    match parse_timestamp(value) {
        Some(dt) => Ok(dt),
        None => parse_date(value).map(day_end),
    }
}

/// Timestamp in the same form chrono's serde writes into stored documents
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
