//! Legacy combined `date_time` field.
//!
//! Older daily fire feeds encode a start time as `201405290000Z`, implicitly
//! UTC and with no real offset information. Current feeds append the true
//! offset instead, e.g. `201508040000-04:00`. Two trailing seconds digits may
//! appear in either form and are ignored.

use chrono::{Duration, NaiveDateTime};
use fire_common::{FireError, FireResult};
use regex::Regex;

const WITH_OFFSET_PATTERN: &str = r"^(\d{12})(\d{2})?([+-]\d{2}:\d{2})$";
const UTC_SUFFIX_PATTERN: &str = r"^(\d{12})(\d{2})?Z$";
const DATE_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Assumed duration of a growth window synthesized from `date_time`.
pub const SYNTHESIZED_WINDOW_HOURS: i64 = 24;

/// A parsed `date_time` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDateTime {
    pub start: NaiveDateTime,
    /// Embedded offset, e.g. `-04:00`. Never set for the `Z` form.
    pub utc_offset: Option<String>,
}

impl LegacyDateTime {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::hours(SYNTHESIZED_WINDOW_HOURS)
    }
}

#[derive(Debug, Clone)]
pub struct DateTimeParser {
    with_offset: Regex,
    utc_suffix: Regex,
}

impl DateTimeParser {
    pub fn new() -> FireResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| FireError::InvalidConfig(e.to_string()))
        };
        Ok(Self {
            with_offset: compile(WITH_OFFSET_PATTERN)?,
            utc_suffix: compile(UTC_SUFFIX_PATTERN)?,
        })
    }

    /// Parse a `date_time` string.
    ///
    /// Returns `Ok(None)` when the value matches neither form, and an error
    /// when it matches but does not describe a real date.
    pub fn parse(&self, value: &str) -> FireResult<Option<LegacyDateTime>> {
        let (digits, utc_offset) = if let Some(caps) = self.with_offset.captures(value) {
            (caps[1].to_string(), Some(caps[3].to_string()))
        } else if let Some(caps) = self.utc_suffix.captures(value) {
            (caps[1].to_string(), None)
        } else {
            return Ok(None);
        };

        let start = NaiveDateTime::parse_from_str(&digits, DATE_TIME_FORMAT)
            .map_err(|e| FireError::invalid_field("date_time", format!("{}: {}", value, e)))?;

        Ok(Some(LegacyDateTime { start, utc_offset }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::time::format_datetime;

    fn parser() -> DateTimeParser {
        DateTimeParser::new().unwrap()
    }

    #[test]
    fn test_parse_with_offset() {
        let parsed = parser().parse("201508040000-04:00").unwrap().unwrap();
        assert_eq!(format_datetime(&parsed.start), "2015-08-04T00:00:00");
        assert_eq!(format_datetime(&parsed.end()), "2015-08-05T00:00:00");
        assert_eq!(parsed.utc_offset.as_deref(), Some("-04:00"));
    }

    #[test]
    fn test_parse_utc_suffix_with_seconds() {
        let parsed = parser().parse("20140529000012Z").unwrap().unwrap();
        assert_eq!(format_datetime(&parsed.start), "2014-05-29T00:00:00");
        assert_eq!(parsed.utc_offset, None);
    }

    #[test]
    fn test_unrecognized_and_invalid() {
        assert_eq!(parser().parse("2014-05-29").unwrap(), None);
        assert!(parser().parse("201413290000Z").is_err());
    }
}
