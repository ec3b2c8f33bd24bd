use alloc::string::String;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::impls::ticks_to_date_time;
use crate::{MalformedError, Result};

/// Naive layouts tried after the offset-carrying forms, most specific first.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Formats a date-time as ISO-8601 in UTC.
///
/// Milliseconds are always present; seven fractional digits are used when
/// the value has sub-millisecond precision.
pub(crate) fn format_date_time(value: NaiveDateTime) -> String {
    let nanos = value.nanosecond() % 1_000_000_000;
    let seconds = value.format("%Y-%m-%dT%H:%M:%S");
    if nanos % 1_000_000 == 0 {
        alloc::format!("{seconds}.{:03}Z", nanos / 1_000_000)
    } else {
        alloc::format!("{seconds}.{:07}Z", nanos / 100)
    }
}

/// Parses every supported date-time form, in order:
///
/// 1. RFC 3339 with offset, normalized to UTC.
/// 2. ISO-8601 without offset, with or without a fraction.
/// 3. RFC 2822 (HTTP dates).
/// 4. `YYYY-MM-DD hh:mm:ss[.f]` and a bare `YYYY-MM-DD`.
/// 5. `/Date(<ms>[+-hhmm])/`, milliseconds since the Unix epoch.
/// 6. A raw tick count.
pub(crate) fn parse_date_time(text: &str) -> Result<NaiveDateTime> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Ok(value.naive_utc());
    }
    if let Some(value) = NAIVE_FORMATS[..2]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Ok(value);
    }
    if let Ok(value) = DateTime::parse_from_rfc2822(text) {
        return Ok(value.naive_utc());
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(text, NAIVE_FORMATS[2]) {
        return Ok(value);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Some(value) = parse_epoch_millis(text) {
        return Ok(value);
    }
    if let Ok(ticks) = text.parse::<i64>() {
        return ticks_to_date_time(ticks);
    }
    Err(MalformedError::InvalidDateTime(text.into()).into())
}

/// Parses `/Date(<ms>)/`; a trailing offset is informational and ignored.
fn parse_epoch_millis(text: &str) -> Option<NaiveDateTime> {
    let inner = text.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let digits = match inner.get(1..)?.find(['+', '-']) {
        Some(offset) => &inner[..offset + 1],
        None => inner,
    };
    let millis = digits.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis).map(|value| value.naive_utc())
}
