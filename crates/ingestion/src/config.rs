//! Ingestion settings.
//!
//! Read once from the `ingestion` section of the run configuration and then
//! shared read-only by the ingester and reconciler.

use fire_common::{FireError, FireResult, LocationFieldSet};
use serde_json::Value;

/// Default allowed deviation of a window's fuelbed percentages from 100.
pub const DEFAULT_FUELBED_PCT_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionConfig {
    /// Optional descriptive location fields recognized on input.
    pub location_fields: LocationFieldSet,
    /// Allowed deviation of fuelbed percentage totals from 100.
    pub fuelbed_pct_tolerance: f64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            location_fields: LocationFieldSet::builtin(),
            fuelbed_pct_tolerance: DEFAULT_FUELBED_PCT_TOLERANCE,
        }
    }
}

impl IngestionConfig {
    /// Build settings from the `ingestion` configuration section, if any.
    ///
    /// Recognized keys: `optional_location_fields` (list of extra names) and
    /// `fuelbed_pct_tolerance` (non-negative number).
    pub fn from_section(section: Option<&Value>) -> FireResult<Self> {
        let section = match section {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(FireError::InvalidConfig(format!(
                    "'ingestion' must be an object, got {}",
                    other
                )))
            }
        };

        let location_fields = match section.get("optional_location_fields") {
            None | Some(Value::Null) => LocationFieldSet::builtin(),
            Some(Value::Array(names)) => {
                let names = names
                    .iter()
                    .map(|n| {
                        n.as_str().map(str::to_string).ok_or_else(|| {
                            FireError::InvalidConfig(format!(
                                "optional location field names must be strings, got {}",
                                n
                            ))
                        })
                    })
                    .collect::<FireResult<Vec<String>>>()?;
                LocationFieldSet::with_additional(names)
            }
            Some(other) => {
                return Err(FireError::InvalidConfig(format!(
                    "'ingestion.optional_location_fields' must be a list, got {}",
                    other
                )))
            }
        };

        let fuelbed_pct_tolerance = match section.get("fuelbed_pct_tolerance") {
            None | Some(Value::Null) => DEFAULT_FUELBED_PCT_TOLERANCE,
            Some(v) => match v.as_f64() {
                Some(t) if t >= 0.0 => t,
                _ => {
                    return Err(FireError::InvalidConfig(format!(
                        "'ingestion.fuelbed_pct_tolerance' must be a non-negative number, got {}",
                        v
                    )))
                }
            },
        };

        Ok(Self {
            location_fields,
            fuelbed_pct_tolerance,
        })
    }
}
