//! Optional descriptive location fields.
//!
//! The set of recognized optional fields is assembled once at startup (built-in
//! names, consumption-model inputs, plus any configured additions) and then
//! shared read-only by the ingester and reconciler.

use std::collections::BTreeSet;

/// Descriptive fields carried alongside a location's geometry or point.
pub const BUILTIN_LOCATION_FIELDS: &[&str] = &[
    "ecoregion",
    "utc_offset",
    "elevation",
    "slope",
    "state",
    "county",
    "country",
    // moisture
    "moisture_1hr",
    "moisture_10hr",
    "moisture_100hr",
    "moisture_1khr",
    "moisture_live",
    "moisture_duff",
    // weather
    "min_wind",
    "max_wind",
    "min_wind_aloft",
    "max_wind_aloft",
    "min_humid",
    "max_humid",
    "min_temp",
    "max_temp",
    "min_temp_hour",
    "max_temp_hour",
    "sunrise_hour",
    "sunset_hour",
    "snow_month",
    "rain_days",
];

/// Inputs accepted by the downstream consumption model, with their synonyms.
pub const CONSUMPTION_INPUT_FIELDS: &[(&str, &[&str])] = &[
    ("fuel_moisture_1000hr_pct", &["fm_1000hr"]),
    ("fuel_moisture_duff_pct", &["fm_duff"]),
    ("fuel_moisture_litter_pct", &["fm_litter"]),
    ("canopy_consumption_pct", &[]),
    ("shrub_blackened_pct", &[]),
    ("pile_blackened_pct", &[]),
    ("days_since_rain", &["rain_days"]),
    ("length_of_ignition", &[]),
    ("fm_type", &[]),
    ("windspeed", &["wind_speed"]),
];

/// Immutable set of optional location field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationFieldSet {
    names: BTreeSet<String>,
}

impl LocationFieldSet {
    /// Built-in descriptive fields plus consumption inputs and synonyms.
    pub fn builtin() -> Self {
        Self::with_additional(std::iter::empty::<String>())
    }

    /// Built-in set extended with caller-supplied names.
    pub fn with_additional<I, S>(additional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> =
            BUILTIN_LOCATION_FIELDS.iter().map(|s| s.to_string()).collect();
        for (field, synonyms) in CONSUMPTION_INPUT_FIELDS {
            names.insert(field.to_string());
            names.extend(synonyms.iter().map(|s| s.to_string()));
        }
        names.extend(additional.into_iter().map(Into::into));
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LocationFieldSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_dedupes_synonyms() {
        let fields = LocationFieldSet::builtin();
        assert!(fields.contains("utc_offset"));
        assert!(fields.contains("fm_duff"));
        // "rain_days" is both built in and a synonym
        assert_eq!(fields.iter().filter(|f| *f == "rain_days").count(), 1);
    }

    #[test]
    fn test_additional_fields() {
        let fields = LocationFieldSet::with_additional(["timezone"]);
        assert!(fields.contains("timezone"));
        assert!(!LocationFieldSet::builtin().contains("timezone"));
    }
}
