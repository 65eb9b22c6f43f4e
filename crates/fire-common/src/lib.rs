//! Canonical fire record types shared across the fire pipeline.

pub mod bbox;
pub mod error;
pub mod fields;
pub mod fire;
pub mod growth;
pub mod time;

pub use bbox::{BoundingBox, LatLng};
pub use error::{ErrorKind, FireError, FireResult, FilterConfigIssue, FilterIssue, MergeIssue};
pub use fields::LocationFieldSet;
pub use fire::{EventOf, FailureDetail, Fire, FireType, FuelType};
pub use growth::{BaseLocation, Fuelbed, Geometry, GrowthWindow, Location};
