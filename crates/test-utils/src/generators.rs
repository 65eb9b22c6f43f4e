//! Builders for canonical fires with predictable growth windows.

use fire_common::time::parse_datetime;
use fire_common::{BaseLocation, Fire, GrowthWindow, Location};
use serde_json::{json, Value};

/// A point-located growth window.
pub fn point_window(lat: f64, lng: f64, area: f64) -> GrowthWindow {
    GrowthWindow::default().with_location(
        BaseLocation::Point {
            latitude: lat,
            longitude: lng,
            area,
        }
        .into_location(),
    )
}

/// A point-located growth window spanning `start`..`end` (growth time format).
pub fn timed_window(start: &str, end: &str, lat: f64, lng: f64, area: f64) -> GrowthWindow {
    let mut window = point_window(lat, lng, area);
    window.start = parse_datetime(start).ok();
    window.end = parse_datetime(end).ok();
    window
}

/// A growth window whose location only names a country.
pub fn country_window(country: &str) -> GrowthWindow {
    let mut location = Location::default();
    location.set_field("country", json!(country));
    GrowthWindow::default().with_location(location)
}

/// A canonical fire with the given growth windows.
///
/// # Panics
///
/// Panics if `windows` is empty.
pub fn fire_with_growth(id: &str, windows: Vec<GrowthWindow>) -> Fire {
    let mut fire = Fire::with_id(id);
    fire.set_growth(windows).expect("growth windows must not be empty");
    fire
}

/// One fire per area, each with a single point window; ids are "1", "2", ...
pub fn fires_with_areas(areas: &[f64]) -> Vec<Fire> {
    areas
        .iter()
        .enumerate()
        .map(|(i, area)| {
            fire_with_growth(&(i + 1).to_string(), vec![point_window(40.0, -120.0, *area)])
        })
        .collect()
}

/// A fire built from JSON, for tests that want raw or partial records.
pub fn fire_from_json(value: Value) -> Fire {
    Fire::from_value(value).expect("fixture must be a valid fire")
}
