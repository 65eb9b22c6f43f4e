//! Raw fire records in each supported input shape.
//!
//! Every fixture describes the same Yosemite-area fire so tests can compare
//! the canonical output across shapes.

use serde_json::{json, Value};

pub const FIRE_ID: &str = "SF11C14225236095807750";
pub const EVENT_ID: &str = "SF11E826544";
pub const EVENT_NAME: &str = "Natural Fire near Yosemite, CA";
pub const LATITUDE: f64 = 37.909644;
pub const LONGITUDE: f64 = -119.7615805;
pub const AREA: f64 = 10000.0;

/// Already canonical: growth windows carry their own location.
pub fn canonical_fire() -> Value {
    json!({
        "id": FIRE_ID,
        "type": "wildfire",
        "event_of": {"id": EVENT_ID, "name": EVENT_NAME},
        "growth": [{
            "start": "2014-05-29T17:00:00",
            "end": "2014-05-30T17:00:00",
            "location": {
                "area": AREA,
                "ecoregion": "western",
                "latitude": LATITUDE,
                "longitude": LONGITUDE,
                "utc_offset": "-07:00"
            }
        }]
    })
}

/// Flat record with scalar location fields and a legacy `date_time`.
pub fn flat_fire() -> Value {
    json!({
        "id": FIRE_ID,
        "event_id": EVENT_ID,
        "name": EVENT_NAME,
        "area": AREA,
        "latitude": LATITUDE,
        "longitude": LONGITUDE,
        "ecoregion": "western",
        "date_time": "201405291700-07:00"
    })
}

/// Deprecated shape: fire-level location split across growth by `pct`.
pub fn deprecated_fire() -> Value {
    json!({
        "id": FIRE_ID,
        "event_of": {"id": EVENT_ID, "name": EVENT_NAME},
        "type": "Wildfire",
        "location": {
            "latitude": LATITUDE,
            "longitude": LONGITUDE,
            "area": AREA,
            "ecoregion": "western",
            "utc_offset": "-07:00"
        },
        "growth": [
            {"start": "2014-05-29T17:00:00", "end": "2014-05-30T17:00:00", "pct": 40},
            {"start": "2014-05-30T17:00:00", "end": "2014-05-31T17:00:00", "pct": 60}
        ]
    })
}

/// Hybrid: top-level event synonyms, nested location, fire-level fuelbeds.
pub fn hybrid_fire() -> Value {
    json!({
        "id": FIRE_ID,
        "event_id": EVENT_ID,
        "name": EVENT_NAME,
        "location": {
            "latitude": LATITUDE,
            "longitude": LONGITUDE,
            "area": AREA
        },
        "utc_offset": "-07:00",
        "fuelbeds": [{"fccs_id": 46, "pct": 70}, {"fccs_id": 47, "pct": 30}],
        "growth": [{"start": "2014-05-29T17:00:00", "end": "2014-05-30T17:00:00"}]
    })
}

/// Canonical fire with one GeoJSON polygon window and no explicit area.
pub fn polygon_fire() -> Value {
    json!({
        "id": "sdk2risodijfdsf",
        "event_of": {"id": "sdfkj234kljfd", "name": "Natural Fire in North Tahoe"},
        "growth": [{
            "start": "2014-05-29T17:00:00",
            "end": "2014-05-30T17:00:00",
            "location": {
                "ecoregion": "western",
                "utc_offset": "-07:00",
                "geojson": {
                    "type": "MultiPolygon",
                    "coordinates": [[[
                        [-121.4522115, 47.4316976],
                        [-121.3990506, 47.4316976],
                        [-121.3990506, 47.4099293],
                        [-121.4522115, 47.4099293],
                        [-121.4522115, 47.4316976]
                    ]]]
                }
            }
        }]
    })
}

/// All four point-based shapes, in declaration order.
pub fn all_shapes() -> Vec<(&'static str, Value)> {
    vec![
        ("canonical", canonical_fire()),
        ("flat", flat_fire()),
        ("deprecated", deprecated_fire()),
        ("hybrid", hybrid_fire()),
    ]
}

/// Filter boundaries used across tests.
pub mod boundary {
    use serde_json::{json, Value};

    /// Large box covering most of the western hemisphere's populated area.
    pub fn wide() -> Value {
        json!({"ne": {"lat": 88.12, "lng": 40}, "sw": {"lat": -50.75, "lng": -131.5}})
    }

    /// Smaller box around the continental US.
    pub fn conus() -> Value {
        json!({"ne": {"lat": 50.0, "lng": -66.0}, "sw": {"lat": 24.0, "lng": -125.0}})
    }
}
