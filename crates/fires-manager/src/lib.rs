//! Fire collection management.
//!
//! [`FiresManager`] owns the fires for one run and drives the collection
//! stages that follow ingestion:
//!
//! - configuration with date-template resolution ([`config`])
//! - per-fire failure handling with a fail-fast or skip policy ([`failure`])
//! - merging of fires submitted more than once ([`merge`])
//! - growth-window filtering by country, boundary and area ([`filter`])
//! - loading and dumping fire documents ([`io`])

pub mod config;
pub mod events;
pub mod failure;
pub mod filter;
pub mod io;
pub mod manager;
pub mod merge;
pub mod summary;

pub use config::{TemplateResolver, DATETIME_PARSE_BUSTER};
pub use events::EventNames;
pub use failure::{failure_detail, BatchOutcome, FailurePolicy, FireOutcome};
pub use filter::{Criterion, GrowthFilter};
pub use manager::FiresManager;
pub use merge::FiresMerger;
pub use summary::{summarize_fuelbeds, FuelbedShare};

/// Version recorded in dumped documents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
