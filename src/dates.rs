use crate::errors::AppError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parses an ISO-8601 timestamp or bare date. Bare dates land on midnight
/// so day-granularity comparisons behave the same either way.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Local).naive_local());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(AppError::validation(format!("Invalid date: {raw}")))
}
