use super::error::{MetricsError, MetricsResult};
use crate::models::VisitTime;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};

/// e.g. "November 22, 2025 at 12:59 PM"
pub const DATETIME_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Render a stored instant for display.
///
/// With an offset, the offset is added to the UTC wall clock as a fixed
/// number of hours (no DST rules apply). Without one, the host's local
/// timezone is used. The stored instant itself is never changed.
pub fn format_datetime(instant: &DateTime<Utc>, tz_offset_hours: Option<f64>) -> String {
    match tz_offset_hours {
        Some(hours) => {
            let shift = Duration::seconds((hours * 3600.0).round() as i64);
            let utc = instant.naive_utc();
            utc.checked_add_signed(shift)
                .unwrap_or(utc)
                .format(DATETIME_FORMAT)
                .to_string()
        }
        None => instant
            .with_timezone(&Local)
            .format(DATETIME_FORMAT)
            .to_string(),
    }
}

/// Naive forms, read as UTC
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Minute-precision forms with a numeric offset
const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%z", "%Y-%m-%d %H:%M%z"];

/// Epoch values above this magnitude are taken as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 2e10;

pub fn resolve_visit_time(value: &VisitTime) -> MetricsResult<DateTime<Utc>> {
    match value {
        VisitTime::Epoch(epoch) => visit_datetime_from_epoch(*epoch),
        VisitTime::Text(raw) => parse_visit_datetime(raw),
    }
}

/// Parse a caller-supplied visit time. Zoned ISO-8601 values (including a
/// trailing `Z`) are converted to UTC; values without a zone are taken as
/// UTC, a bare date as midnight UTC. Numeric strings are Unix timestamps.
pub fn parse_visit_datetime(raw: &str) -> MetricsResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(epoch) = raw.parse::<f64>() {
        return visit_datetime_from_epoch(epoch);
    }

    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Ok(zoned.with_timezone(&Utc));
    }

    let with_offset = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    for format in ZONED_FORMATS {
        if let Ok(zoned) = DateTime::parse_from_str(&with_offset, format) {
            return Ok(zoned.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(MetricsError::invalid(format!(
        "datetime_visited is not a valid ISO-8601 timestamp: {raw}"
    )))
}

/// Unix timestamp in seconds, or milliseconds for large magnitudes.
pub fn visit_datetime_from_epoch(epoch: f64) -> MetricsResult<DateTime<Utc>> {
    let out_of_range =
        || MetricsError::invalid(format!("datetime_visited is not a valid Unix timestamp: {epoch}"));

    if !epoch.is_finite() {
        return Err(out_of_range());
    }
    let seconds = if epoch.abs() > EPOCH_MILLIS_THRESHOLD {
        epoch / 1000.0
    } else {
        epoch
    };
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    DateTime::from_timestamp_micros(micros as i64).ok_or_else(out_of_range)
}
