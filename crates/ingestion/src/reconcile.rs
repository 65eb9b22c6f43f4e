//! Structure reconciliation.
//!
//! Raw records may define location and fuelbeds for the whole fire or for each
//! growth window. After reconciliation both live on the growth windows only,
//! and each is defined in exactly one place.

use fire_common::{Fire, FireError, FireResult, Fuelbed, GrowthWindow, Location, LocationFieldSet};
use fire_common::time::format_datetime;

/// A fire mid-ingestion, still carrying fire-level location and fuelbeds.
#[derive(Debug, Clone, Default)]
pub struct FireDraft {
    pub fire: Fire,
    pub location: Location,
    pub fuelbeds: Vec<Fuelbed>,
    pub growth: Vec<GrowthWindow>,
}

impl FireDraft {
    pub fn new(fire: Fire) -> Self {
        Self {
            fire,
            ..Self::default()
        }
    }

    /// Finish a reconciled draft.
    pub fn into_fire(self) -> FireResult<Fire> {
        let FireDraft {
            mut fire, growth, ..
        } = self;
        fire.set_growth(growth)?;
        Ok(fire)
    }
}

/// Moves fire-level location and fuelbeds onto growth windows and validates
/// the result.
#[derive(Debug, Clone, Copy)]
pub struct StructureReconciler<'a> {
    location_fields: &'a LocationFieldSet,
    fuelbed_pct_tolerance: f64,
}

impl<'a> StructureReconciler<'a> {
    pub fn new(location_fields: &'a LocationFieldSet, fuelbed_pct_tolerance: f64) -> Self {
        Self {
            location_fields,
            fuelbed_pct_tolerance,
        }
    }

    pub fn process(&self, draft: &mut FireDraft) -> FireResult<()> {
        self.distribute_locations_and_fuelbeds(draft)?;
        self.validate(draft)
    }

    fn distribute_locations_and_fuelbeds(&self, draft: &mut FireDraft) -> FireResult<()> {
        let top_base = draft.location.base();

        if draft.growth.is_empty() {
            let base = top_base.ok_or(FireError::NoGrowthOrBaseLocation)?;
            let mut location = base.into_location();
            location.fill_missing_fields(&draft.location, self.location_fields);
            let mut window = GrowthWindow::default().with_location(location);
            window.fuelbeds = std::mem::take(&mut draft.fuelbeds);
            draft.growth.push(window);
        } else {
            let num_windows = draft.growth.len();
            if draft.location.geojson.is_some() && num_windows > 1 {
                return Err(FireError::OneGeojsonMultipleGrowth);
            }
            // legacy shape: fire-level area split across windows by pct
            let top_area = draft.location.area.filter(|a| *a != 0.0);

            for window in draft.growth.iter_mut() {
                let pct = window.pct.take();
                let window_base = window.location.as_ref().and_then(Location::base);

                if !draft.fuelbeds.is_empty() && !window.fuelbeds.is_empty() {
                    return Err(FireError::FuelbedsAtTopOrPerGrowth);
                }

                let previous = window.location.take().unwrap_or_default();
                let location = match (&top_base, window_base) {
                    (Some(top), None) => {
                        let mut location = top.clone().into_location();
                        if let Some(area) = top_area {
                            let pct = match pct.filter(|p| *p != 0.0) {
                                Some(pct) => pct,
                                None if num_windows == 1 => 100.0,
                                None => return Err(FireError::MultipleGrowthNoPct),
                            };
                            location.area = Some(area * pct / 100.0);
                        }
                        location.fill_missing_fields(&previous, self.location_fields);
                        location.fill_missing_fields(&draft.location, self.location_fields);
                        location
                    }
                    (None, Some(base)) => {
                        let mut location = base.into_location();
                        location.fill_missing_fields(&previous, self.location_fields);
                        location.fill_missing_fields(&draft.location, self.location_fields);
                        location
                    }
                    _ => return Err(FireError::BaseLocationAtTopOrPerGrowth),
                };
                window.location = Some(location);

                if !draft.fuelbeds.is_empty() {
                    window.fuelbeds = draft.fuelbeds.clone();
                }
            }
        }

        draft.location = Location::default();
        draft.fuelbeds.clear();
        Ok(())
    }

    fn validate(&self, draft: &FireDraft) -> FireResult<()> {
        for window in &draft.growth {
            if let (Some(start), Some(end)) = (window.start, window.end) {
                if start > end {
                    return Err(FireError::InvalidGrowthTimes {
                        start: format_datetime(&start),
                        end: format_datetime(&end),
                    });
                }
            }

            if !window.fuelbeds.is_empty() {
                let total = window.fuelbed_pct_total();
                if (total - 100.0).abs() > self.fuelbed_pct_tolerance {
                    return Err(FireError::FuelbedPercentages { total });
                }
            }
        }
        Ok(())
    }
}
