//! Growth-window filtering.
//!
//! Each criterion decides per growth window, not per fire. After a criterion
//! runs, fires left without any growth are dropped from the collection.
//! Filtering is idempotent for a fixed configuration.

use std::collections::HashSet;

use fire_common::bbox::BboxParseError;
use fire_common::{
    BoundingBox, Fire, FireError, FireResult, FilterConfigIssue, FilterIssue, GrowthWindow,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::failure::FailurePolicy;

/// Keys under the `filter` section that name a criterion.
pub const FILTER_KEYS: &[&str] = &["country", "location", "area"];

/// A single filter criterion, validated.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    CountryWhitelist(HashSet<String>),
    CountryBlacklist(HashSet<String>),
    Boundary(BoundingBox),
    Area { min: Option<f64>, max: Option<f64> },
}

impl Criterion {
    fn name(&self) -> &'static str {
        match self {
            Criterion::CountryWhitelist(_) | Criterion::CountryBlacklist(_) => "country",
            Criterion::Boundary(_) => "location",
            Criterion::Area { .. } => "area",
        }
    }

    /// Whether to keep `window`. Errors describe bad window data.
    fn keep(&self, window: &GrowthWindow) -> Result<bool, FilterIssue> {
        match self {
            Criterion::CountryWhitelist(codes) => {
                Ok(window.country().map_or(false, |c| codes.contains(c)))
            }
            Criterion::CountryBlacklist(codes) => {
                Ok(window.country().map_or(true, |c| !codes.contains(c)))
            }
            Criterion::Boundary(bbox) => match (window.latitude(), window.longitude()) {
                (Some(lat), Some(lng)) => Ok(bbox.contains_point(lat, lng)),
                _ => Err(FilterIssue::MissingLatLng),
            },
            Criterion::Area { min, max } => {
                let area = window.area().ok_or(FilterIssue::MissingArea)?;
                if area < 0.0 {
                    return Err(FilterIssue::NegativeArea);
                }
                Ok(min.map_or(true, |m| area >= m) && max.map_or(true, |m| area <= m))
            }
        }
    }
}

/// Filters a fire collection by the criteria found in configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthFilter {
    criteria: Vec<Criterion>,
}

impl GrowthFilter {
    /// Build from the `filter` configuration section.
    ///
    /// Criteria run in the order country, location, area, and only those
    /// present in the section are applied.
    pub fn from_config(section: Option<&Value>) -> FireResult<Self> {
        let empty = Map::new();
        let section = match section {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => &empty,
            Some(other) => {
                return Err(FireError::InvalidConfig(format!(
                    "filter configuration must be a map, got {}",
                    other
                )))
            }
        };

        let mut criteria = Vec::new();
        for &key in FILTER_KEYS {
            let Some(config) = section.get(key) else {
                continue;
            };
            let config = match config {
                Value::Object(map) if !map.is_empty() => map,
                _ => return Err(FilterConfigIssue::MissingFilterConfig.into()),
            };
            criteria.push(match key {
                "country" => country_criterion(config)?,
                "location" => boundary_criterion(config)?,
                _ => area_criterion(config)?,
            });
        }

        if criteria.is_empty() {
            return Err(FilterConfigIssue::NoFilters.into());
        }
        Ok(Self { criteria })
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Apply every criterion in turn, returning the surviving fires.
    ///
    /// A fire whose growth data cannot be evaluated aborts the pass, unless
    /// the policy is [`FailurePolicy::Skip`], in which case that fire is
    /// left as it was.
    pub fn apply(&self, fires: &[Fire], policy: FailurePolicy) -> FireResult<Vec<Fire>> {
        let mut fires = fires.to_vec();
        for criterion in &self.criteria {
            let before = fires.len();
            fires = apply_criterion(criterion, fires, policy)?;
            info!(
                filter = criterion.name(),
                before,
                after = fires.len(),
                "Filtered fires"
            );
        }
        Ok(fires)
    }
}

fn apply_criterion(
    criterion: &Criterion,
    fires: Vec<Fire>,
    policy: FailurePolicy,
) -> FireResult<Vec<Fire>> {
    let mut kept = Vec::with_capacity(fires.len());
    for mut fire in fires {
        let decisions: Result<Vec<bool>, FilterIssue> = if fire.is_pending() {
            Err(FilterIssue::NotIngested)
        } else {
            fire.growth().iter().map(|g| criterion.keep(g)).collect()
        };

        match decisions {
            Ok(decisions) => {
                let mut keep = decisions.into_iter();
                fire.retain_growth(|_| keep.next().unwrap_or(false));
                if fire.has_growth() {
                    kept.push(fire);
                } else {
                    debug!(fire_id = %fire.id(), filter = criterion.name(), "Removed fire");
                }
            }
            Err(reason) => {
                let error = FireError::FilterData {
                    fire_id: fire.id().to_string(),
                    reason,
                };
                if !policy.is_skip() {
                    return Err(error);
                }
                warn!(error = %error, "Leaving fire unfiltered");
                kept.push(fire);
            }
        }
    }
    Ok(kept)
}

fn country_criterion(config: &Map<String, Value>) -> FireResult<Criterion> {
    let whitelist = country_codes(config.get("whitelist"))?;
    let blacklist = country_codes(config.get("blacklist"))?;
    match (whitelist, blacklist) {
        (Some(codes), None) => Ok(Criterion::CountryWhitelist(codes)),
        (None, Some(codes)) => Ok(Criterion::CountryBlacklist(codes)),
        _ => Err(FilterConfigIssue::SpecifyWhitelistOrBlacklist.into()),
    }
}

/// Null or empty lists count as not given.
fn country_codes(value: Option<&Value>) -> FireResult<Option<HashSet<String>>> {
    let list = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(list)) if list.is_empty() => return Ok(None),
        Some(Value::Array(list)) => list,
        Some(other) => {
            return Err(FireError::InvalidConfig(format!(
                "country list must be an array, got {}",
                other
            )))
        }
    };
    list.iter()
        .map(|code| {
            code.as_str().map(str::to_string).ok_or_else(|| {
                FireError::InvalidConfig(format!("country code must be a string, got {}", code))
            })
        })
        .collect::<FireResult<HashSet<_>>>()
        .map(Some)
}

fn boundary_criterion(config: &Map<String, Value>) -> FireResult<Criterion> {
    let boundary = config
        .get("boundary")
        .ok_or(FilterConfigIssue::SpecifyBoundary)?;
    BoundingBox::from_json(boundary)
        .map(Criterion::Boundary)
        .map_err(|e| match e {
            BboxParseError::InvalidBoundary => FilterConfigIssue::InvalidBoundary.into(),
            _ => FilterConfigIssue::InvalidBoundaryFields.into(),
        })
}

fn area_criterion(config: &Map<String, Value>) -> FireResult<Criterion> {
    let bound = |key: &str| -> FireResult<Option<f64>> {
        match config.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                FireError::InvalidConfig(format!("area '{}' must be a number, got {}", key, value))
            }),
        }
    };
    let min = bound("min")?;
    let max = bound("max")?;

    if min.is_none() && max.is_none() {
        return Err(FilterConfigIssue::SpecifyMinOrMax.into());
    }
    if min.map_or(false, |m| m < 0.0) || max.map_or(false, |m| m < 0.0) {
        return Err(FilterConfigIssue::MinMaxMustBeNonNegative.into());
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(FilterConfigIssue::MinMustBeLteMax.into());
        }
    }
    Ok(Criterion::Area { min, max })
}
