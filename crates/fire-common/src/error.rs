//! Error types for the fire pipeline.

use thiserror::Error;

/// Result type alias using FireError.
pub type FireResult<T> = Result<T, FireError>;

/// Broad classification of a [`FireError`].
///
/// Only [`ErrorKind::DataValidation`] errors are subject to a skip-on-failure
/// policy; everything else always surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A specific fire or growth window violates a structural invariant.
    DataValidation,
    /// Caller-supplied settings are structurally invalid.
    Configuration,
    /// An immutability rule was broken (e.g. reassigning the run id).
    Invariant,
    /// The serialized fire document could not be read or written.
    Document,
}

/// Primary error type for fire operations.
#[derive(Debug, Error)]
pub enum FireError {
    // === Ingestion / Reconciliation Errors ===
    #[error("Fire contains no data")]
    NoData,

    #[error(
        "Growth percentage, 'pct', must be defined if there are more than one growth objects \
         and location is defined at the fire's top level."
    )]
    MultipleGrowthNoPct,

    #[error("Can't assign fire GeoJSON to multiple growth windows")]
    OneGeojsonMultipleGrowth,

    #[error(
        "GeoJSON or lat+lng+area must be defined for the entire fire or for each growth object, \
         not both"
    )]
    BaseLocationAtTopOrPerGrowth,

    #[error(
        "Fuelbeds may be defined for the entire fire or for each growth object, or for neither, \
         not both"
    )]
    FuelbedsAtTopOrPerGrowth,

    #[error("GeoJSON or lat+lng+area must be defined for the entire fire if no growth windows are defined")]
    NoGrowthOrBaseLocation,

    // === Record Field Errors ===
    #[error("Invalid fire 'type': {0}")]
    InvalidFireType(String),

    #[error("Invalid fire 'fuel_type': {0}")]
    InvalidFuelType(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Growth windows, once defined, must not be empty")]
    EmptyGrowth,

    #[error("Growth window start {start} is after end {end}")]
    InvalidGrowthTimes { start: String, end: String },

    #[error("Invalid fuelbed: {0}")]
    InvalidFuelbed(String),

    #[error("Fuelbed percentages must sum to 100, got {total}")]
    FuelbedPercentages { total: f64 },

    // === Collection Stage Errors ===
    #[error("Failed to merge fire {fire_id}: {reason}")]
    Merge { fire_id: String, reason: MergeIssue },

    #[error("Failed to filter fire {fire_id}: {reason}")]
    FilterData { fire_id: String, reason: FilterIssue },

    // === Configuration Errors ===
    #[error("{0}")]
    FilterConfig(FilterConfigIssue),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Invariant Errors ===
    #[error("run_id is immutable and has already been set")]
    RunIdImmutable,

    #[error("Fire 'id' is immutable once assigned")]
    FireIdImmutable,

    // === Document Errors ===
    #[error("Invalid fire document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a group of fires sharing an id could not be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeIssue {
    #[error("Fire has invalid keys for merging")]
    InvalidKeys,

    #[error("Fire types don't match")]
    FireTypeMismatch,

    #[error("Fuel types don't match")]
    FuelTypeMismatch,

    #[error("Fire events don't match")]
    EventMismatch,

    #[error("Growth data must be defined for all or none of the fires being merged")]
    GrowthForBothOrNone,
}

/// Per-growth-window data problems found while filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilterIssue {
    #[error("Missing lat/lng for growth window")]
    MissingLatLng,

    #[error("Missing area for growth window")]
    MissingArea,

    #[error("Negative area for growth window")]
    NegativeArea,

    #[error("Fire has not been ingested")]
    NotIngested,
}

/// Structural problems with the `filter` configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilterConfigIssue {
    #[error("No filters specified")]
    NoFilters,

    #[error("Specify config for each filter")]
    MissingFilterConfig,

    #[error("Specify whitelist or blacklist - not both")]
    SpecifyWhitelistOrBlacklist,

    #[error("Specify boundary to filter by location")]
    SpecifyBoundary,

    #[error("Filter boundary must specify 'ne' and 'sw' corners, each with 'lat' and 'lng'")]
    InvalidBoundaryFields,

    #[error("Invalid boundary")]
    InvalidBoundary,

    #[error("Specify min and/or max area for filtering")]
    SpecifyMinOrMax,

    #[error("Min and max area must be non-negative")]
    MinMaxMustBeNonNegative,

    #[error("Min area must be less than or equal to max area")]
    MinMustBeLteMax,
}

impl FireError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FireError::FilterConfig(_) | FireError::InvalidConfig(_) => ErrorKind::Configuration,

            FireError::RunIdImmutable | FireError::FireIdImmutable => ErrorKind::Invariant,

            FireError::InvalidDocument(_) | FireError::Json(_) | FireError::Io(_) => {
                ErrorKind::Document
            }

            _ => ErrorKind::DataValidation,
        }
    }

    /// Whether a skip-on-failure policy may absorb this error.
    pub fn is_skippable(&self) -> bool {
        self.kind() == ErrorKind::DataValidation
    }

    /// Shorthand for an [`FireError::InvalidField`] error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        FireError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<FilterConfigIssue> for FireError {
    fn from(issue: FilterConfigIssue) -> Self {
        FireError::FilterConfig(issue)
    }
}
