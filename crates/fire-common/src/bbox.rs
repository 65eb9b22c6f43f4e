//! Geographic bounding boxes used to filter growth windows by location.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A rectangle defined by its north-east and south-west corners (EPSG:4326).
///
/// Does not wrap the antimeridian: the south-west corner must lie west of
/// (or on) the north-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ne: LatLng,
    pub sw: LatLng,
}

impl BoundingBox {
    /// Create a validated bounding box from its corners.
    pub fn new(ne: LatLng, sw: LatLng) -> Result<Self, BboxParseError> {
        if !ne.in_range() || !sw.in_range() || sw.lat > ne.lat || sw.lng > ne.lng {
            return Err(BboxParseError::InvalidBoundary);
        }
        Ok(Self { ne, sw })
    }

    /// Parse a `{"ne": {"lat", "lng"}, "sw": {"lat", "lng"}}` object.
    ///
    /// Exactly those keys are accepted; anything extra or missing is a field error.
    pub fn from_json(value: &Value) -> Result<Self, BboxParseError> {
        let corners = value.as_object().ok_or(BboxParseError::InvalidFields)?;
        if corners.len() != 2 {
            return Err(BboxParseError::InvalidFields);
        }
        let ne = corner(corners.get("ne"))?;
        let sw = corner(corners.get("sw"))?;
        Self::new(ne, sw)
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat >= self.sw.lat && lat <= self.ne.lat && lng >= self.sw.lng && lng <= self.ne.lng
    }
}

fn corner(value: Option<&Value>) -> Result<LatLng, BboxParseError> {
    let obj = value
        .and_then(Value::as_object)
        .ok_or(BboxParseError::InvalidFields)?;
    if obj.len() != 2 {
        return Err(BboxParseError::InvalidFields);
    }
    let lat = obj.get("lat").and_then(Value::as_f64);
    let lng = obj.get("lng").and_then(Value::as_f64);
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(BboxParseError::InvalidFields),
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum BboxParseError {
    #[error("Boundary must specify 'ne' and 'sw' corners, each with 'lat' and 'lng'")]
    InvalidFields,

    #[error("Boundary corners out of range or inverted")]
    InvalidBoundary,
}
