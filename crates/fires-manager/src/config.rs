//! Run configuration: nested maps with date-template tokens.
//!
//! String values may embed `{today}`, `{yesterday}` or `{today-N}` /
//! `{yesterday+N}` tokens, each optionally followed by `:FORMAT` (strftime).
//! Tokens render with `%Y%m%d` unless a format is given. A value that is
//! nothing but a single unformatted token resolves to a full timestamp
//! (`2016-05-03T00:00:00`) instead; prefix it with
//! [`DATETIME_PARSE_BUSTER`] to force the plain `%Y%m%d` rendering.
//!
//! Raw values are kept alongside the resolved view, so resolving again for
//! a new reference date always starts from the original text.

use std::fmt::Write as _;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use fire_common::time::{format_datetime, parse_datetime};
use fire_common::{FireError, FireResult};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::warn;

/// Prefix that keeps a lone date token rendered as text.
pub const DATETIME_PARSE_BUSTER: &str = "{datetime-parse-buster}";

const DEFAULT_DATE_FORMAT: &str = "%Y%m%d";
const TOKEN_PATTERN: &str = r"\{(today|yesterday)(?:([+-])(\d+))?(?::([^}]*))?\}";

/// Resolves date tokens relative to a reference day.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    token: Regex,
}

impl TemplateResolver {
    pub fn new() -> FireResult<Self> {
        let token = Regex::new(TOKEN_PATTERN).map_err(|e| FireError::InvalidConfig(e.to_string()))?;
        Ok(Self { token })
    }

    /// Resolve every string in `raw`, recursing through arrays and maps.
    pub fn resolve(&self, raw: &Value, today: NaiveDate) -> Value {
        match raw {
            Value::String(s) => Value::String(self.resolve_str(s, today)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve(v, today)).collect()),
            Value::Object(map) => Value::Object(self.resolve_map(map, today)),
            other => other.clone(),
        }
    }

    pub fn resolve_map(&self, raw: &Map<String, Value>, today: NaiveDate) -> Map<String, Value> {
        raw.iter()
            .map(|(k, v)| (k.clone(), self.resolve(v, today)))
            .collect()
    }

    fn resolve_str(&self, s: &str, today: NaiveDate) -> String {
        if let Some(rest) = s.strip_prefix(DATETIME_PARSE_BUSTER) {
            return self.substitute(rest, today);
        }

        if let Some(caps) = self.token.captures(s) {
            let whole = caps.get(0).map_or(0, |m| m.len());
            if whole == s.len() && caps.get(4).is_none() {
                if let Some(day) = token_date(&caps, today) {
                    return format_datetime(&day.and_time(NaiveTime::MIN));
                }
            }
        }

        self.substitute(s, today)
    }

    /// Replace each token with its formatted date. Tokens that cannot be
    /// rendered are left as they are.
    pub fn substitute(&self, s: &str, today: NaiveDate) -> String {
        self.token
            .replace_all(s, |caps: &Captures| {
                let original = caps[0].to_string();
                let Some(day) = token_date(caps, today) else {
                    warn!(token = %original, "Date offset out of range; leaving token as is");
                    return original;
                };
                let format = caps.get(4).map_or(DEFAULT_DATE_FORMAT, |m| m.as_str());
                match format_date(day, format) {
                    Some(text) => text,
                    None => {
                        warn!(token = %original, format = %format, "Invalid date format; leaving token as is");
                        original
                    }
                }
            })
            .into_owned()
    }

    /// Interpret a "today" setting: a timestamp, a date, or a date token
    /// relative to `reference`.
    pub fn parse_today(&self, value: &str, reference: NaiveDate) -> FireResult<NaiveDateTime> {
        let resolved = self.substitute(value.trim(), reference);
        parse_datetime(&resolved).map_err(|e| FireError::invalid_field("today", e.to_string()))
    }
}

fn token_date(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let base = match &caps[1] {
        "yesterday" => today.checked_sub_days(Days::new(1))?,
        _ => today,
    };
    let (Some(sign), Some(n)) = (caps.get(2), caps.get(3)) else {
        return Some(base);
    };
    let days = Days::new(n.as_str().parse().ok()?);
    match sign.as_str() {
        "-" => base.checked_sub_days(days),
        _ => base.checked_add_days(days),
    }
}

fn format_date(day: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", day.and_time(NaiveTime::MIN).format(format)).ok()?;
    Some(out)
}

/// Deep merge `source` into `target`: nested maps merge key by key, any
/// other value from `source` replaces what was there.
pub fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge_maps(existing, incoming),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Set a nested value, creating intermediate maps. A non-map value sitting
/// on the path is replaced by a map.
pub fn set_value(target: &mut Map<String, Value>, value: Value, keys: &[&str]) -> FireResult<()> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(FireError::InvalidConfig("no configuration keys given".to_string()));
    };

    let mut node = target;
    for key in parents {
        let entry = node
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        node = entry
            .as_object_mut()
            .ok_or_else(|| FireError::InvalidConfig(format!("'{}' is not a map", key)))?;
    }
    node.insert(last.to_string(), value);
    Ok(())
}

/// Look up a nested value.
pub fn get_value<'a>(source: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    rest.iter()
        .try_fold(source.get(*first)?, |node, key| node.as_object()?.get(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> TemplateResolver {
        TemplateResolver::new().unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw_config() -> Value {
        json!({
            "foo": "bar",
            "bar": "{today}-sdf-{yesterday:%Y-%m-%d}T12Z-%Y__%m-%d-{today-2:%m_%d}-",
            "baz": 234,
            "foobar": "2016-10-11",
            "barbaz": "{today-1}",
            "foobarbaz": "{datetime-parse-buster}2016-10-11",
            "barbazfoo": "{datetime-parse-buster}{today-1}"
        })
    }

    #[test]
    fn test_resolve_relative_to_today() {
        let resolved = resolver().resolve(&raw_config(), day(2016, 5, 4));
        assert_eq!(
            resolved,
            json!({
                "foo": "bar",
                "bar": "20160504-sdf-2016-05-03T12Z-%Y__%m-%d-05_02-",
                "baz": 234,
                "foobar": "2016-10-11",
                "barbaz": "2016-05-03T00:00:00",
                "foobarbaz": "2016-10-11",
                "barbazfoo": "20160503"
            })
        );

        let resolved = resolver().resolve(&raw_config(), day(2016, 5, 5));
        assert_eq!(resolved["bar"], "20160505-sdf-2016-05-04T12Z-%Y__%m-%d-05_03-");
        assert_eq!(resolved["barbaz"], "2016-05-04T00:00:00");
        assert_eq!(resolved["barbazfoo"], "20160504");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let r = resolver();
        let once = r.resolve(&raw_config(), day(2016, 5, 4));
        let twice = r.resolve(&once, day(2016, 5, 4));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nested_and_offsets() {
        let raw = json!({"a": {"b": ["{yesterday+2:%d}", "{today+10}"]}});
        let resolved = resolver().resolve(&raw, day(2016, 5, 30));
        assert_eq!(resolved, json!({"a": {"b": ["31", "20160609"]}}));
    }

    #[test]
    fn test_invalid_format_leaves_token() {
        let r = resolver();
        assert_eq!(r.substitute("x-{today:%Q}", day(2016, 5, 4)), "x-{today:%Q}");
        // timezone specifiers cannot be rendered for a naive date
        assert_eq!(r.substitute("{today:%z}", day(2016, 5, 4)), "{today:%z}");
    }

    #[test]
    fn test_parse_today() {
        let r = resolver();
        let reference = day(2016, 4, 20);
        assert_eq!(
            format_datetime(&r.parse_today("2012-04-02T22:11:00Z", reference).unwrap()),
            "2012-04-02T22:11:00"
        );
        assert_eq!(
            format_datetime(&r.parse_today("{today}", reference).unwrap()),
            "2016-04-20T00:00:00"
        );
        assert_eq!(
            format_datetime(&r.parse_today("{yesterday}", reference).unwrap()),
            "2016-04-19T00:00:00"
        );
        assert!(r.parse_today("someday", reference).is_err());
    }

    #[test]
    fn test_merge_maps_is_deep() {
        let mut target = json!({"foo": {"a": 111, "b": 222}}).as_object().cloned().unwrap();
        let source = json!({"foo": {"b": 2222, "bb": "bb"}, "bar": {"b": "b"}, "b": "b"})
            .as_object()
            .cloned()
            .unwrap();
        merge_maps(&mut target, source);
        assert_eq!(
            Value::Object(target),
            json!({"foo": {"a": 111, "b": 2222, "bb": "bb"}, "bar": {"b": "b"}, "b": "b"})
        );
    }

    #[test]
    fn test_set_and_get_value() {
        let mut config = Map::new();
        set_value(&mut config, json!(true), &["merge", "skip_failures"]).unwrap();
        set_value(&mut config, json!("23"), &["dci"]).unwrap();
        assert_eq!(get_value(&config, &["merge", "skip_failures"]), Some(&json!(true)));
        assert_eq!(get_value(&config, &["dci"]), Some(&json!("23")));
        assert_eq!(get_value(&config, &["merge", "missing"]), None);
        assert_eq!(get_value(&config, &["dci", "deeper"]), None);

        // a scalar on the path gets replaced
        set_value(&mut config, json!(1), &["dci", "deeper"]).unwrap();
        assert_eq!(get_value(&config, &["dci", "deeper"]), Some(&json!(1)));

        assert!(set_value(&mut config, json!(1), &[]).is_err());
    }
}
