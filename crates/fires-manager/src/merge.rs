//! Merging of fires that share an id.
//!
//! Upstream feeds sometimes submit the same fire more than once, each
//! submission carrying a different slice of its growth. Members of a group
//! must agree on type, fuel type and event before their growth windows are
//! concatenated in start order. Overlapping windows are not detected.

use std::collections::HashMap;

use fire_common::{Fire, FireError, FireResult, GrowthWindow, MergeIssue};
use tracing::{debug, info, warn};

use crate::failure::FailurePolicy;

/// Collapses fires sharing an id into one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiresMerger {
    policy: FailurePolicy,
}

impl FiresMerger {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Merge `fires`, returning the new collection.
    ///
    /// Output order follows the first appearance of each id. Under
    /// [`FailurePolicy::Skip`] a group that cannot be merged is kept as its
    /// separate members; otherwise the first such group aborts the merge.
    pub fn merge(&self, fires: &[Fire]) -> FireResult<Vec<Fire>> {
        let groups = group_by_id(fires);
        let mut merged = Vec::with_capacity(groups.len());

        for group in groups {
            if group.len() == 1 {
                merged.push(group[0].clone());
                continue;
            }

            match merge_group(&group) {
                Ok(fire) => {
                    debug!(fire_id = %fire.id(), members = group.len(), "Merged fire");
                    merged.push(fire);
                }
                Err(e) if self.policy.is_skip() && e.is_skippable() => {
                    warn!(error = %e, members = group.len(), "Leaving fires unmerged");
                    merged.extend(group.into_iter().cloned());
                }
                Err(e) => return Err(e),
            }
        }

        info!(before = fires.len(), after = merged.len(), "Merged fires");
        Ok(merged)
    }
}

fn group_by_id(fires: &[Fire]) -> Vec<Vec<&Fire>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Fire>> = Vec::new();
    for fire in fires {
        match index.get(fire.id()) {
            Some(&i) => groups[i].push(fire),
            None => {
                index.insert(fire.id(), groups.len());
                groups.push(vec![fire]);
            }
        }
    }
    groups
}

fn merge_group(group: &[&Fire]) -> FireResult<Fire> {
    let first = group[0];
    let fail = |reason: MergeIssue| FireError::Merge {
        fire_id: first.id().to_string(),
        reason,
    };

    if group.iter().any(|f| f.has_uningested_keys()) {
        return Err(fail(MergeIssue::InvalidKeys));
    }

    // an event on one member requires a matching event id on every member
    let event_id = |f: &Fire| {
        f.event_of()
            .filter(|e| !e.is_empty())
            .map(|e| e.id.clone())
    };
    for &other in &group[1..] {
        if other.fire_type() != first.fire_type() {
            return Err(fail(MergeIssue::FireTypeMismatch));
        }
        if other.fuel_type() != first.fuel_type() {
            return Err(fail(MergeIssue::FuelTypeMismatch));
        }
        if event_id(other) != event_id(first) {
            return Err(fail(MergeIssue::EventMismatch));
        }
        if other.has_growth() != first.has_growth() {
            return Err(fail(MergeIssue::GrowthForBothOrNone));
        }
    }

    let mut merged = first.clone();
    if first.has_growth() {
        let mut growth: Vec<GrowthWindow> = group
            .iter()
            .flat_map(|f| f.growth().iter().cloned())
            .collect();
        // stable: windows without a start keep arrival order, after the rest
        growth.sort_by_key(|g| (g.start.is_none(), g.start));
        merged.set_growth(growth)?;
    }
    Ok(merged)
}
