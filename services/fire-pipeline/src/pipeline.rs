//! Stage orchestration.
//!
//! Runs the requested stages against a [`FiresManager`] in order, recording
//! each completed stage in the manager's processing log.

use std::fmt;
use std::str::FromStr;

use fire_common::{FireError, FireResult};
use fires_manager::{EventNames, FailurePolicy, FiresManager};
use ingestion::{FireIngester, IngestionConfig};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Stages run when none are requested.
pub const DEFAULT_STAGES: &[Stage] = &[Stage::Ingestion, Stage::Merge, Stage::Filter];

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Merge,
    Filter,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Merge => "merge",
            Stage::Filter => "filter",
        }
    }
}

impl FromStr for Stage {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ingestion" => Ok(Stage::Ingestion),
            "merge" => Ok(Stage::Merge),
            "filter" => Ok(Stage::Filter),
            other => Err(FireError::InvalidConfig(format!("Unknown module: {}", other))),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse stage names, e.g. from "ingestion,merge,filter".
pub fn parse_stages<I, S>(names: I) -> FireResult<Vec<Stage>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|n| !n.as_ref().trim().is_empty())
        .map(|n| n.as_ref().parse())
        .collect()
}

/// An ordered list of stages plus the inputs they need beyond the manager.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    events: Option<EventNames>,
    summarize: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_STAGES.to_vec())
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            events: None,
            summarize: false,
        }
    }

    /// Name raw fires from an events list before ingestion.
    pub fn with_events(mut self, events: EventNames) -> Self {
        self.events = Some(events);
        self
    }

    /// Store a fuelbed summary in the output metadata once all stages ran.
    pub fn with_summary(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order. The first stage error stops the run.
    pub fn run(&self, manager: &mut FiresManager) -> FireResult<()> {
        info!(
            run_id = %manager.run_id(),
            stages = ?self.stages.iter().map(Stage::as_str).collect::<Vec<_>>(),
            fires = manager.num_fires(),
            "Starting pipeline"
        );

        for &stage in &self.stages {
            let before = manager.num_fires();
            match stage {
                Stage::Ingestion => self.ingest(manager)?,
                Stage::Merge => {
                    manager.merge_fires()?;
                    manager.processed(stage.as_str(), fires_manager::VERSION, Map::new());
                }
                Stage::Filter => {
                    manager.filter_fires()?;
                    manager.processed(stage.as_str(), fires_manager::VERSION, Map::new());
                }
            }
            info!(
                stage = %stage,
                before,
                after = manager.num_fires(),
                "Stage complete"
            );
        }

        if self.summarize {
            let summary = serde_json::to_value(manager.fuelbed_summary())?;
            let mut meta = Map::new();
            meta.insert("fuelbeds".to_string(), summary);
            manager
                .meta_mut()
                .insert("summary".to_string(), Value::Object(meta));
        }

        info!(
            fires = manager.num_fires(),
            failed = manager.failed_fires().map_or(0, <[_]>::len),
            "Pipeline complete"
        );
        Ok(())
    }

    fn ingest(&self, manager: &mut FiresManager) -> FireResult<()> {
        if let Some(events) = &self.events {
            let named = events.apply(manager.fires_mut())?;
            info!(named, events = events.len(), "Attached event names");
        }

        let config = IngestionConfig::from_section(manager.get_config_value(&["ingestion"]))?;
        let ingester = FireIngester::new(config)?;
        let policy = FailurePolicy::from_skip_flag(manager.skip_failed_fires());

        let outcome = manager.apply_to_fires(policy, |fire| ingester.ingest(fire))?;
        if outcome.failed() > 0 {
            warn!(
                failed = outcome.failed(),
                succeeded = outcome.succeeded(),
                "Some fires failed ingestion"
            );
        }

        let parsed_input: Vec<Value> = outcome.into_values().into_iter().map(Value::Object).collect();
        let mut record = Map::new();
        record.insert("parsed_input".to_string(), Value::Array(parsed_input));
        manager.processed(ingestion::MODULE_NAME, ingestion::VERSION, record);
        Ok(())
    }
}
