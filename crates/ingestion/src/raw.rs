//! Lookups over a relocated raw input record.

use fire_common::{FireError, FireResult, Fuelbed, Geometry};
use serde_json::{Map, Value};

/// Fuelbed keys carried over from raw input.
pub const FUELBED_FIELDS: &[&str] = &[
    "fccs_id",
    "pct",
    "fuel_loadings",
    "consumption",
    "emissions",
    "emissions_details",
];

/// Whether a raw value counts as "given". Null, false, zero and empty
/// containers do not.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Read-only view of one raw record.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> RawRecord<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Top-level value, treating explicit nulls as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        non_null(self.map.get(key))
    }

    /// Top-level value only if it is truthy.
    pub fn get_truthy(&self, key: &str) -> Option<&'a Value> {
        self.get(key).filter(|v| truthy(v))
    }

    /// Look up `key` under `section` first, falling back to the top level.
    pub fn field(&self, key: &str, section: &str) -> Option<&'a Value> {
        let nested = self
            .map
            .get(section)
            .and_then(Value::as_object)
            .and_then(|s| non_null(s.get(key)));
        nested.or_else(|| self.get(key))
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.map
    }

    pub fn section(&self, section: &str) -> Option<&'a Map<String, Value>> {
        self.map.get(section).and_then(Value::as_object)
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Look up `key` on `entry` first, then under its `location` object.
pub fn entry_field<'a>(entry: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    non_null(entry.get(key)).or_else(|| {
        entry
            .get("location")
            .and_then(Value::as_object)
            .and_then(|l| non_null(l.get(key)))
    })
}

/// Interpret a numeric field, accepting numbers or numeric strings.
pub fn number(field: &str, value: Option<&Value>) -> FireResult<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FireError::invalid_field(field, format!("'{}' is not a number", s))),
        Some(other) => Err(FireError::invalid_field(
            field,
            format!("{} is not a number", other),
        )),
    }
}

/// Interpret a textual field, stringifying numbers.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn geometry(value: Option<&Value>) -> FireResult<Option<Geometry>> {
    match value {
        Some(v) if truthy(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| FireError::invalid_field("geojson", e.to_string())),
        _ => Ok(None),
    }
}

/// Build fuelbeds from a raw list, keeping only recognized keys.
pub fn fuelbeds(value: Option<&Value>) -> FireResult<Vec<Fuelbed>> {
    let entries = match value {
        Some(v) if truthy(v) => v
            .as_array()
            .ok_or_else(|| FireError::InvalidFuelbed(format!("expected a list, got {}", v)))?,
        _ => return Ok(Vec::new()),
    };

    let mut fuelbeds = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry
            .as_object()
            .ok_or_else(|| FireError::InvalidFuelbed(format!("expected an object, got {}", entry)))?;
        let kept: Map<String, Value> = FUELBED_FIELDS
            .iter()
            .filter_map(|k| non_null(entry.get(*k)).map(|v| (k.to_string(), v.clone())))
            .collect();
        if kept.is_empty() {
            continue;
        }
        let fuelbed: Fuelbed = serde_json::from_value(Value::Object(kept))
            .map_err(|e| FireError::InvalidFuelbed(e.to_string()))?;
        fuelbeds.push(fuelbed);
    }
    Ok(fuelbeds)
}
