//! Fire record ingestion.
//!
//! Normalizes raw fire records into canonical [`fire_common::Fire`]s.
//!
//! # Supported input shapes
//!
//! - Already canonical records (growth windows carrying their own location)
//! - Flat records with scalar `latitude`, `longitude`, `area` and `date_time`
//! - The deprecated shape with a top-level `location` plus `growth` windows
//!   carrying a `pct` share of the fire's area
//! - Hybrids of the above, e.g. top-level `event_id` and `name` synonyms
//!
//! # Pipeline
//!
//! 1. [`FireIngester`] relocates the raw record and runs its field handlers
//! 2. [`StructureReconciler`] moves fire-level location and fuelbeds onto
//!    growth windows and validates the result

pub mod config;
pub mod date_time;
mod ingester;
pub mod raw;
mod reconcile;

/// Name recorded in the processing log.
pub const MODULE_NAME: &str = "ingestion";

/// Version recorded in the processing log.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{IngestionConfig, DEFAULT_FUELBED_PCT_TOLERANCE};
pub use ingester::{FireIngester, PASSTHROUGH_GROWTH_FIELDS, SCALAR_FIELDS};
pub use reconcile::{FireDraft, StructureReconciler};
