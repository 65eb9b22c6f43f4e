//! Fire pipeline service library.
//!
//! Loads run configuration and drives the ingestion, merge and filter
//! stages over a fire document.

pub mod config_loader;
pub mod pipeline;

pub use config_loader::{load_event_names, load_run_config, RunConfigFile};
pub use pipeline::{parse_stages, Pipeline, Stage, DEFAULT_STAGES};
