//! Growth windows and their locations and fuelbeds.

use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::fields::LocationFieldSet;
use crate::time::{self, to_utc};

/// GeoJSON geometry types that inherently describe an area.
pub const AREA_GEOMETRIES: &[&str] = &["Polygon", "MultiPolygon"];

/// A GeoJSON geometry. Coordinates are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,

    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    pub fn new(geometry_type: impl Into<String>, coordinates: Value) -> Self {
        Self {
            geometry_type: geometry_type.into(),
            coordinates,
        }
    }

    /// Whether this geometry type carries area on its own.
    pub fn carries_area(&self) -> bool {
        AREA_GEOMETRIES.contains(&self.geometry_type.as_str())
    }
}

/// The part of a location that places it on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseLocation {
    /// A geometry; `area` is required unless the geometry is a polygon.
    Geometry { geojson: Geometry, area: Option<f64> },
    /// A single point with an explicit burned area.
    Point {
        latitude: f64,
        longitude: f64,
        area: f64,
    },
}

impl BaseLocation {
    /// Apply the location resolution rule.
    ///
    /// A geometry wins when present, but needs an explicit area or an
    /// area-bearing geometry type. Otherwise latitude, longitude and area are
    /// all required. Zero area counts as absent.
    pub fn resolve(
        geojson: Option<&Geometry>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        area: Option<f64>,
    ) -> Option<Self> {
        let area = area.filter(|a| *a != 0.0);
        if let Some(geojson) = geojson {
            if area.is_some() || geojson.carries_area() {
                return Some(BaseLocation::Geometry {
                    geojson: geojson.clone(),
                    area,
                });
            }
            return None;
        }
        match (latitude, longitude, area) {
            (Some(latitude), Some(longitude), Some(area)) => Some(BaseLocation::Point {
                latitude,
                longitude,
                area,
            }),
            _ => None,
        }
    }

    pub fn area(&self) -> Option<f64> {
        match self {
            BaseLocation::Geometry { area, .. } => *area,
            BaseLocation::Point { area, .. } => Some(*area),
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, BaseLocation::Geometry { .. })
    }

    /// Build a location holding only this base.
    pub fn into_location(self) -> Location {
        match self {
            BaseLocation::Geometry { geojson, area } => Location {
                geojson: Some(geojson),
                area,
                ..Location::default()
            },
            BaseLocation::Point {
                latitude,
                longitude,
                area,
            } => Location {
                latitude: Some(latitude),
                longitude: Some(longitude),
                area: Some(area),
                ..Location::default()
            },
        }
    }
}

/// Where a growth window burned, plus optional descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Geometry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    /// Descriptive fields (ecoregion, utc_offset, weather, moisture, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Location {
    /// Resolve the base location, if this location defines one.
    pub fn base(&self) -> Option<BaseLocation> {
        BaseLocation::resolve(self.geojson.as_ref(), self.latitude, self.longitude, self.area)
    }

    pub fn is_empty(&self) -> bool {
        self.geojson.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.area.is_none()
            && self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Parsed `utc_offset`; absent or unparseable offsets yield `None`.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.fields
            .get("utc_offset")
            .and_then(|v| time::utc_offset_from_value(v).ok())
    }

    /// Country code, if any. Empty strings count as absent.
    pub fn country(&self) -> Option<&str> {
        self.fields
            .get("country")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Copy optional fields from `source` that this location lacks.
    ///
    /// Values already present here always win.
    pub fn fill_missing_fields(&mut self, source: &Location, allowed: &LocationFieldSet) {
        for (name, value) in &source.fields {
            if allowed.contains(name) && !self.fields.contains_key(name) {
                self.fields.insert(name.clone(), value.clone());
            }
        }
    }
}

/// One fuelbed's share of a growth window's area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fuelbed {
    #[serde(deserialize_with = "string_or_number")]
    pub fccs_id: String,

    pub pct: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_loadings: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_details: Option<Value>,
}

impl Fuelbed {
    pub fn new(fccs_id: impl Into<String>, pct: f64) -> Self {
        Self {
            fccs_id: fccs_id.into(),
            pct,
            fuel_loadings: None,
            consumption: None,
            emissions: None,
            emissions_details: None,
        }
    }
}

/// A time-bounded slice of a fire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthWindow {
    #[serde(
        default,
        with = "time::optional_naive",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<NaiveDateTime>,

    #[serde(
        default,
        with = "time::optional_naive",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,

    /// Legacy share of the parent fire's area, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fuelbeds: Vec<Fuelbed>,

    /// Fields attached by other stages (localmet, timeprofile, plumerise, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GrowthWindow {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The window's UTC offset, defaulting to zero.
    pub fn utc_offset(&self) -> FixedOffset {
        self.location
            .as_ref()
            .and_then(Location::utc_offset)
            .unwrap_or_else(time::utc)
    }

    pub fn start_utc(&self) -> Option<NaiveDateTime> {
        self.start.map(|s| to_utc(s, self.utc_offset()))
    }

    pub fn end_utc(&self) -> Option<NaiveDateTime> {
        self.end.map(|e| to_utc(e, self.utc_offset()))
    }

    pub fn latitude(&self) -> Option<f64> {
        self.location.as_ref().and_then(|l| l.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.as_ref().and_then(|l| l.longitude)
    }

    pub fn area(&self) -> Option<f64> {
        self.location.as_ref().and_then(|l| l.area)
    }

    pub fn country(&self) -> Option<&str> {
        self.location.as_ref().and_then(Location::country)
    }

    pub fn fuelbed_pct_total(&self) -> f64 {
        self.fuelbeds.iter().map(|fb| fb.pct).sum()
    }
}

/// Accept identifiers given either as strings or as numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
