//! Time handling utilities for growth windows.
//!
//! Growth window timestamps are naive local times. They only become absolute
//! instants when paired with the window's `utc_offset`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde_json::Value;

/// Canonical serialization format for growth window timestamps.
pub const GROWTH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    GROWTH_TIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y%m%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%d%H%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid utc_offset: {0}")]
    InvalidOffset(String),
}

/// Parse a timestamp into a naive datetime.
///
/// Strings carrying an explicit offset (RFC 3339) keep their wall-clock
/// value; date-only strings resolve to midnight.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(ndt);
            }
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format a timestamp the way growth windows are serialized.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(GROWTH_TIME_FORMAT).to_string()
}

/// Parse a UTC offset such as `-07:00`, `+0530`, `03:00` or `Z`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, TimeParseError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => match (rest.get(..2), rest.get(2..)) {
            (Some(h), Some(m)) => (h, m),
            _ => return Err(TimeParseError::InvalidOffset(s.to_string())),
        },
        None => (rest, "0"),
    };

    let hours: i32 = hours
        .parse()
        .map_err(|_| TimeParseError::InvalidOffset(s.to_string()))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| TimeParseError::InvalidOffset(s.to_string()))?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(TimeParseError::InvalidOffset(s.to_string()));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| TimeParseError::InvalidOffset(s.to_string()))
}

/// Interpret a JSON `utc_offset` value: either an offset string or a number of hours.
pub fn utc_offset_from_value(value: &Value) -> Result<FixedOffset, TimeParseError> {
    match value {
        Value::String(s) => parse_utc_offset(s),
        Value::Number(n) => n
            .as_f64()
            .and_then(|hours| FixedOffset::east_opt((hours * 3600.0).round() as i32))
            .ok_or_else(|| TimeParseError::InvalidOffset(n.to_string())),
        other => Err(TimeParseError::InvalidOffset(other.to_string())),
    }
}

/// Offset of zero.
pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Convert a local naive time to UTC using the given offset.
pub fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> NaiveDateTime {
    local - Duration::seconds(offset.local_minus_utc() as i64)
}

/// Serde adapter for optional growth window timestamps.
pub mod optional_naive {
    use super::{format_datetime, parse_datetime};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_datetime(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.trim().is_empty() => parse_datetime(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_growth_time() {
        let dt = parse_datetime("2014-05-29T17:00:00").unwrap();
        assert_eq!(dt.year(), 2014);
        assert_eq!(dt.month(), 5);
        assert_eq!(dt.day(), 29);
        assert_eq!(dt.hour(), 17);
    }

    #[test]
    fn test_parse_rfc3339_keeps_wall_clock() {
        let dt = parse_datetime("2012-04-02T22:11:00Z").unwrap();
        assert_eq!(dt.hour(), 22);
        assert_eq!(dt.minute(), 11);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2016-10-11").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2016, 10, 11, 0));
        assert!(parse_datetime("not a date").is_err());
    }

    #[test]
    fn test_parse_utc_offsets() {
        assert_eq!(parse_utc_offset("-07:00").unwrap().local_minus_utc(), -7 * 3600);
        assert_eq!(parse_utc_offset("03:00").unwrap().local_minus_utc(), 3 * 3600);
        assert_eq!(parse_utc_offset("+0530").unwrap().local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("-25:00").is_err());
        assert!(parse_utc_offset("abc").is_err());
    }

    #[test]
    fn test_parse_utc_offset_rejects_non_ascii() {
        for input in ["a€", "+a€", "-€12", "0€", "07:€"] {
            assert!(
                matches!(parse_utc_offset(input), Err(TimeParseError::InvalidOffset(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_to_utc() {
        let local = parse_datetime("2014-05-29T17:00:00").unwrap();
        let offset = parse_utc_offset("-07:00").unwrap();
        assert_eq!(format_datetime(&to_utc(local, offset)), "2014-05-30T00:00:00");
    }

    #[test]
    fn test_numeric_offset() {
        let offset = utc_offset_from_value(&serde_json::json!(-5.0)).unwrap();
        assert_eq!(offset.local_minus_utc(), -5 * 3600);
    }
}
