use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::{MetricsError, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Zero offset, for journals kept in UTC.
pub fn utc() -> FixedOffset {
    Utc.fix()
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse a trade timestamp.
///
/// RFC 3339 values keep their own offset. Values without an offset are
/// carried with a zero offset, which leaves their wall-clock time untouched.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    parse_naive(trimmed)
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| MetricsError::parse(field, value))
}

/// Parse a trade timestamp into the viewer's wall-clock time.
///
/// Offset-bearing values are converted into `tz`. Values without an offset
/// were recorded in local time already and are returned as they are.
pub fn parse_local(field: &str, value: &str, tz: FixedOffset) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&tz).naive_local());
    }

    parse_naive(trimmed).ok_or_else(|| MetricsError::parse(field, value))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start.checked_sub_months(Months::new(1)).unwrap_or(start)
}

/// First and last calendar day of `year`-`month`.
pub fn month_window(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| MetricsError::InvalidDate(format!("{}-{:02}", year, month)))?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| MetricsError::InvalidDate(format!("{}-{:02}", year, month)))?;
    Ok((start, end))
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// The Saturday on or after `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_sunday() as u64;
    date.checked_add_days(Days::new(offset)).unwrap_or(date)
}

pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}
