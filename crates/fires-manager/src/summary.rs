//! Collection-wide fuelbed summary.

use std::collections::BTreeMap;

use fire_common::Fire;
use serde::Serialize;

/// One fuelbed's share of the total burned area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelbedShare {
    pub fccs_id: String,
    /// Percent of the summed area of every window that has fuelbeds.
    pub pct: f64,
    /// Area attributed to this fuelbed.
    pub area: f64,
}

/// Area-weighted fuelbed percentages across every growth window of every
/// fire, ordered by fuelbed id.
///
/// Windows without an area or without fuelbeds do not contribute.
pub fn summarize_fuelbeds(fires: &[Fire]) -> Vec<FuelbedShare> {
    let mut areas: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total = 0.0;

    for window in fires.iter().flat_map(|f| f.growth()) {
        let Some(area) = window.area() else {
            continue;
        };
        if window.fuelbeds.is_empty() {
            continue;
        }
        total += area;
        for fuelbed in &window.fuelbeds {
            *areas.entry(fuelbed.fccs_id.as_str()).or_default() += area * fuelbed.pct / 100.0;
        }
    }

    if total <= 0.0 {
        return Vec::new();
    }

    areas
        .into_iter()
        .map(|(fccs_id, area)| FuelbedShare {
            fccs_id: fccs_id.to_string(),
            pct: 100.0 * area / total,
            area,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_area_weighted() {
        let fires = vec![
            Fire::from_value(json!({"id": "1", "growth": [
                {"location": {"area": 300}, "fuelbeds": [
                    {"fccs_id": 46, "pct": 50}, {"fccs_id": 47, "pct": 50}
                ]},
                {"location": {"area": 50}}
            ]}))
            .unwrap(),
            Fire::from_value(json!({"id": "2", "growth": [
                {"location": {"area": 100}, "fuelbeds": [{"fccs_id": "47", "pct": 100}]}
            ]}))
            .unwrap(),
        ];

        let summary = summarize_fuelbeds(&fires);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].fccs_id, "46");
        assert_approx_eq!(summary[0].pct, 37.5, 1e-9);
        assert_approx_eq!(summary[0].area, 150.0, 1e-9);
        assert_eq!(summary[1].fccs_id, "47");
        assert_approx_eq!(summary[1].pct, 62.5, 1e-9);
    }

    #[test]
    fn test_no_fuelbeds() {
        let fires = vec![Fire::with_id("1")];
        assert!(summarize_fuelbeds(&fires).is_empty());
    }
}
