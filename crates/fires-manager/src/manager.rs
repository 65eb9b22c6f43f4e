//! The fire collection manager.

use std::sync::OnceLock;

use chrono::{NaiveDateTime, NaiveTime, Utc};
use fire_common::{Fire, FireError, FireResult};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{self, TemplateResolver};
use crate::failure::{failure_detail, BatchOutcome, FailurePolicy, FireOutcome};
use crate::filter::GrowthFilter;
use crate::merge::FiresMerger;
use crate::summary::{summarize_fuelbeds, FuelbedShare};

/// Owns the fire collection for one run, along with its metadata,
/// configuration, run id and failed fires.
///
/// Stages mutate the collection in place, one after another.
#[derive(Debug)]
pub struct FiresManager {
    fires: Vec<Fire>,
    meta: Map<String, Value>,
    raw_config: Map<String, Value>,
    config: Map<String, Value>,
    templates: TemplateResolver,
    today: NaiveDateTime,
    run_id: OnceLock<String>,
    failed_fires: Option<Vec<Fire>>,
    processing: Vec<Value>,
}

impl FiresManager {
    pub fn new() -> FireResult<Self> {
        let today = Utc::now().date_naive().and_time(NaiveTime::MIN);
        Ok(Self {
            fires: Vec::new(),
            meta: Map::new(),
            raw_config: Map::new(),
            config: Map::new(),
            templates: TemplateResolver::new()?,
            today,
            run_id: OnceLock::new(),
            failed_fires: None,
            processing: Vec::new(),
        })
    }

    pub fn with_run_id(run_id: impl Into<String>) -> FireResult<Self> {
        let mut manager = Self::new()?;
        manager.set_run_id(run_id)?;
        Ok(manager)
    }

    // === Fires & Metadata ===

    pub fn fires(&self) -> &[Fire] {
        &self.fires
    }

    pub fn fires_mut(&mut self) -> &mut Vec<Fire> {
        &mut self.fires
    }

    pub fn set_fires(&mut self, fires: Vec<Fire>) {
        self.fires = fires;
    }

    pub fn add_fire(&mut self, fire: Fire) {
        self.fires.push(fire);
    }

    pub fn num_fires(&self) -> usize {
        self.fires.len()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.meta
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    // === Run Id ===

    /// The run id, generated on first access.
    pub fn run_id(&self) -> &str {
        self.run_id.get_or_init(|| Uuid::new_v4().to_string())
    }

    /// Assign the run id. Fails once an id exists, however it was set.
    pub fn set_run_id(&mut self, run_id: impl Into<String>) -> FireResult<()> {
        self.run_id
            .set(run_id.into())
            .map_err(|_| FireError::RunIdImmutable)
    }

    pub(crate) fn has_run_id(&self) -> bool {
        self.run_id.get().is_some()
    }

    // === Today ===

    pub fn today(&self) -> NaiveDateTime {
        self.today
    }

    /// Set the reference day from a timestamp, a date, or a `{today}` /
    /// `{yesterday}` / `{today-N}` token relative to the current date.
    pub fn set_today(&mut self, value: &str) -> FireResult<()> {
        let reference = Utc::now().date_naive();
        let today = self.templates.parse_today(value, reference)?;
        self.set_today_datetime(today);
        Ok(())
    }

    pub fn set_today_datetime(&mut self, today: NaiveDateTime) {
        if today != self.today {
            self.today = today;
            self.resolve_config();
        }
    }

    // === Configuration ===

    /// Configuration with date tokens resolved against [`Self::today`].
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn raw_config(&self) -> &Map<String, Value> {
        &self.raw_config
    }

    pub fn set_config(&mut self, config: Value) -> FireResult<()> {
        self.raw_config = config_map(config)?;
        self.resolve_config();
        Ok(())
    }

    /// Deep-merge `config` over the current configuration.
    pub fn merge_config(&mut self, config: Value) -> FireResult<()> {
        config::merge_maps(&mut self.raw_config, config_map(config)?);
        self.resolve_config();
        Ok(())
    }

    pub fn set_config_value(&mut self, value: Value, keys: &[&str]) -> FireResult<()> {
        config::set_value(&mut self.raw_config, value, keys)?;
        self.resolve_config();
        Ok(())
    }

    pub fn get_config_value(&self, keys: &[&str]) -> Option<&Value> {
        config::get_value(&self.config, keys)
    }

    fn config_flag(&self, keys: &[&str]) -> bool {
        self.get_config_value(keys)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn resolve_config(&mut self) {
        self.config = self
            .templates
            .resolve_map(&self.raw_config, self.today.date());
        debug!(today = %self.today, "Resolved configuration");
    }

    // === Failure Handling ===

    /// Whether per-fire failures during ingestion should be skipped.
    pub fn skip_failed_fires(&self) -> bool {
        self.config_flag(&["skip_failed_fires"])
    }

    /// Fires set aside under a skip policy. `None` until one fails.
    pub fn failed_fires(&self) -> Option<&[Fire]> {
        self.failed_fires.as_deref()
    }

    pub(crate) fn set_failed_fires(&mut self, failed: Option<Vec<Fire>>) {
        self.failed_fires = failed;
    }

    /// Run `op` on each fire in turn.
    ///
    /// When `op` fails with a data error under [`FailurePolicy::Skip`], the
    /// fire is annotated with the error, moved to the failed fires, and the
    /// pass continues. Any other failure stops the pass: the fire stays in
    /// the collection (annotated, for data errors) and the error is
    /// returned.
    pub fn apply_to_fires<T, F>(
        &mut self,
        policy: FailurePolicy,
        mut op: F,
    ) -> FireResult<BatchOutcome<T>>
    where
        F: FnMut(&mut Fire) -> FireResult<T>,
    {
        let mut pending = std::mem::take(&mut self.fires).into_iter();
        let mut kept = Vec::with_capacity(pending.len());
        let mut outcomes = Vec::new();

        while let Some(mut fire) = pending.next() {
            match op(&mut fire) {
                Ok(value) => {
                    outcomes.push(FireOutcome::Succeeded {
                        fire_id: fire.id().to_string(),
                        value,
                    });
                    kept.push(fire);
                }
                Err(error) if policy.is_skip() && error.is_skippable() => {
                    warn!(fire_id = %fire.id(), error = %error, "Skipping failed fire");
                    let detail = failure_detail(&error);
                    fire.set_error(detail.clone());
                    outcomes.push(FireOutcome::Failed {
                        fire_id: fire.id().to_string(),
                        detail,
                    });
                    self.failed_fires.get_or_insert_with(Vec::new).push(fire);
                }
                Err(error) => {
                    if error.is_skippable() {
                        fire.set_error(failure_detail(&error));
                    }
                    kept.push(fire);
                    kept.extend(pending);
                    self.fires = kept;
                    return Err(error);
                }
            }
        }

        self.fires = kept;
        Ok(BatchOutcome { outcomes })
    }

    // === Aggregates ===

    /// Earliest growth start across the collection, in UTC.
    pub fn earliest_start(&self) -> Option<NaiveDateTime> {
        self.fires.iter().filter_map(Fire::start_utc).min()
    }

    /// Latest growth end across the collection, in UTC.
    pub fn latest_end(&self) -> Option<NaiveDateTime> {
        self.fires.iter().filter_map(Fire::end_utc).max()
    }

    pub fn fuelbed_summary(&self) -> Vec<FuelbedShare> {
        summarize_fuelbeds(&self.fires)
    }

    // === Processing Log ===

    /// Record that a module processed the collection.
    pub fn processed(&mut self, module: &str, version: &str, extra: Map<String, Value>) {
        let mut record = Map::new();
        record.insert("module".to_string(), Value::String(module.to_string()));
        record.insert("version".to_string(), Value::String(version.to_string()));
        record.extend(extra);
        self.processing.push(Value::Object(record));
    }

    pub fn processing(&self) -> &[Value] {
        &self.processing
    }

    pub(crate) fn set_processing(&mut self, processing: Vec<Value>) {
        self.processing = processing;
    }

    // === Stages ===

    /// Merge fires sharing an id. Leaves the collection untouched on error.
    pub fn merge_fires(&mut self) -> FireResult<()> {
        let policy = FailurePolicy::from_skip_flag(self.config_flag(&["merge", "skip_failures"]));
        let merged = FiresMerger::new(policy).merge(&self.fires)?;
        self.fires = merged;
        Ok(())
    }

    /// Filter growth windows by the `filter` configuration section. Leaves
    /// the collection untouched on error.
    ///
    /// Under `filter.skip_failures` an unusable configuration turns the
    /// stage into a no-op.
    pub fn filter_fires(&mut self) -> FireResult<()> {
        let policy = FailurePolicy::from_skip_flag(self.config_flag(&["filter", "skip_failures"]));
        let filter = match GrowthFilter::from_config(self.get_config_value(&["filter"])) {
            Ok(filter) => filter,
            Err(e) if policy.is_skip() => {
                warn!(error = %e, "Skipping filter");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let filtered = filter.apply(&self.fires, policy)?;
        info!(remaining = filtered.len(), "Filter complete");
        self.fires = filtered;
        Ok(())
    }
}

fn config_map(config: Value) -> FireResult<Map<String, Value>> {
    match config {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(FireError::InvalidConfig(format!(
            "configuration must be a map, got {}",
            other
        ))),
    }
}
