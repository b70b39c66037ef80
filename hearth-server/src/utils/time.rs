//! Business timezone date conversions
//!
//! Date-to-timestamp conversion happens at the API handler layer; the
//! repository layer only ever sees `i64` Unix millis.

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD).
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::invalid_request(format!("invalid date format: {date}")))
}

/// Date + hour/min/sec to Unix millis in the business timezone.
///
/// DST gap fallback: when the local time does not exist, the UTC
/// interpretation is used instead.
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = match date.and_hms_opt(hour, min, sec) {
        Some(n) => n,
        None => date.and_hms_opt(0, 0, 0).unwrap_or_default(),
    };
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Start of day (00:00:00) in the business timezone, as Unix millis.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// End of day as the next day's 00:00:00 in the business timezone.
///
/// Callers use `< end` (exclusive) semantics.
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}
