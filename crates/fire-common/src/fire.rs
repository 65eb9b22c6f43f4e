//! The canonical fire record.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FireError, FireResult};
use crate::growth::{string_or_number, GrowthWindow};

/// Top-level keys that only appear on records which have not been ingested.
pub const UNINGESTED_KEYS: &[&str] = &[
    "location",
    "fuelbeds",
    "latitude",
    "longitude",
    "area",
    "geojson",
    "date_time",
    "start",
    "end",
];

/// Kind of burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FireType {
    #[default]
    Wildfire,
    Prescribed,
}

impl FireType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FireType::Wildfire => "wildfire",
            FireType::Prescribed => "rx",
        }
    }
}

impl FromStr for FireType {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wildfire" | "wf" => Ok(FireType::Wildfire),
            "rx" | "prescribed" => Ok(FireType::Prescribed),
            _ => Err(FireError::InvalidFireType(s.to_string())),
        }
    }
}

impl fmt::Display for FireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of the fuel being burned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuelType {
    #[default]
    Natural,
    Activity,
    Piles,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Natural => "natural",
            FuelType::Activity => "activity",
            FuelType::Piles => "piles",
        }
    }
}

impl FromStr for FuelType {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "natural" => Ok(FuelType::Natural),
            "activity" => Ok(FuelType::Activity),
            "piles" => Ok(FuelType::Piles),
            _ => Err(FireError::InvalidFuelType(s.to_string())),
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_str_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_str_serde!(FireType);
impl_str_serde!(FuelType);

/// Reference to the larger event a fire belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventOf {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.url.is_none() && self.extra.is_empty()
    }
}

/// Error annotation attached to a fire that failed processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub message: String,
    pub traceback: String,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// One wildfire or prescribed burn.
///
/// Recognized fields are validated on every mutation. Anything else a caller
/// supplies is kept verbatim in an open extension map.
///
/// A fire read from a document keeps the record as submitted until it is
/// ingested. When that record does not parse as a canonical fire the fire is
/// *pending*: its fields keep their defaults, the record lives in the
/// extension map, and it serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fire {
    #[serde(default = "generate_id", deserialize_with = "string_or_number")]
    id: String,

    #[serde(rename = "type", default)]
    fire_type: FireType,

    #[serde(default)]
    fuel_type: FuelType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_of: Option<EventOf>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    meta: Map<String, Value>,

    #[serde(default, deserialize_with = "non_empty_growth")]
    growth: Vec<GrowthWindow>,

    #[serde(default)]
    error: Option<FailureDetail>,

    #[serde(flatten)]
    extra: Map<String, Value>,

    /// Dropped on any change that cannot be mirrored onto it.
    #[serde(skip)]
    submitted: Option<Map<String, Value>>,

    #[serde(skip)]
    pending: bool,
}

/// `growth`, when given, must hold at least one window.
fn non_empty_growth<'de, D>(deserializer: D) -> Result<Vec<GrowthWindow>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Vec<GrowthWindow>>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(growth) if growth.is_empty() => {
            Err(serde::de::Error::custom(FireError::EmptyGrowth))
        }
        Some(growth) => Ok(growth),
    }
}

#[derive(Serialize)]
struct CanonicalFire<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    fire_type: FireType,
    fuel_type: FuelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_of: Option<&'a EventOf>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    meta: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "no_growth")]
    growth: &'a [GrowthWindow],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a FailureDetail>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

fn no_growth(growth: &&[GrowthWindow]) -> bool {
    growth.is_empty()
}

#[derive(Serialize)]
struct SubmittedRecord<'a> {
    #[serde(flatten)]
    record: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a FailureDetail>,
}

impl Serialize for Fire {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.submitted, self.pending) {
            (Some(record), true) => SubmittedRecord {
                record,
                error: self.error.as_ref(),
            }
            .serialize(serializer),
            _ => CanonicalFire {
                id: &self.id,
                fire_type: self.fire_type,
                fuel_type: self.fuel_type,
                event_of: self.event_of.as_ref(),
                meta: &self.meta,
                growth: &self.growth,
                error: self.error.as_ref(),
                extra: &self.extra,
            }
            .serialize(serializer),
        }
    }
}

impl Default for Fire {
    fn default() -> Self {
        Self::new()
    }
}

impl Fire {
    /// A new fire with a generated id and default type and fuel type.
    pub fn new() -> Self {
        Self::with_id(generate_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fire_type: FireType::default(),
            fuel_type: FuelType::default(),
            event_of: None,
            meta: Map::new(),
            growth: Vec::new(),
            error: None,
            extra: Map::new(),
            submitted: None,
            pending: false,
        }
    }

    /// Wrap a record read from a document, keeping it as submitted.
    ///
    /// Never fails: a record that does not parse as a canonical fire becomes
    /// a pending fire and any problem with it surfaces at ingestion. A
    /// missing id is generated and written into the record.
    pub fn from_submitted(mut record: Map<String, Value>) -> Self {
        let id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                let id = generate_id();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        match serde_json::from_value::<Fire>(Value::Object(record.clone())) {
            Ok(mut fire) => {
                fire.submitted = Some(record);
                fire
            }
            Err(_) => {
                let mut extra = record.clone();
                extra.remove("id");
                Self {
                    extra,
                    submitted: Some(record),
                    pending: true,
                    ..Self::with_id(id)
                }
            }
        }
    }

    /// The record as submitted, if this fire came from a document and has
    /// not been changed or ingested since.
    pub fn submitted(&self) -> Option<&Map<String, Value>> {
        self.submitted.as_ref()
    }

    /// Whether the submitted record did not parse as a canonical fire.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Build a fire from an arbitrary JSON object.
    pub fn from_value(value: Value) -> FireResult<Self> {
        if !value.is_object() {
            return Err(FireError::InvalidDocument(format!(
                "fire must be an object, got {}",
                value
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_map(map: Map<String, Value>) -> FireResult<Self> {
        Self::from_value(Value::Object(map))
    }

    pub fn to_map(&self) -> FireResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(FireError::InvalidDocument(format!(
                "fire serialized to non-object {}",
                other
            ))),
        }
    }

    // --- identity ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fire_type(&self) -> FireType {
        self.fire_type
    }

    /// Set `type` from its textual form, validating it.
    pub fn set_type(&mut self, value: &str) -> FireResult<()> {
        self.fire_type = value.parse()?;
        self.submitted = None;
        Ok(())
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    pub fn event_of(&self) -> Option<&EventOf> {
        self.event_of.as_ref()
    }

    pub fn set_event_of(&mut self, event_of: Option<EventOf>) {
        self.event_of = event_of.filter(|e| !e.is_empty());
        self.submitted = None;
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Map<String, Value> {
        self.submitted = None;
        &mut self.meta
    }

    // --- growth ---

    pub fn growth(&self) -> &[GrowthWindow] {
        &self.growth
    }

    pub fn growth_mut(&mut self) -> &mut [GrowthWindow] {
        self.submitted = None;
        &mut self.growth
    }

    pub fn has_growth(&self) -> bool {
        !self.growth.is_empty()
    }

    /// Replace the growth windows. Once defined they must not be empty.
    pub fn set_growth(&mut self, growth: Vec<GrowthWindow>) -> FireResult<()> {
        if growth.is_empty() {
            return Err(FireError::EmptyGrowth);
        }
        self.growth = growth;
        self.submitted = None;
        Ok(())
    }

    /// Keep only the growth windows matching `keep`. May leave the fire with
    /// no growth, in which case the caller is expected to drop it.
    pub fn retain_growth<F>(&mut self, keep: F)
    where
        F: FnMut(&GrowthWindow) -> bool,
    {
        self.growth.retain(keep);
        self.submitted = None;
    }

    // --- failure annotation ---

    pub fn error(&self) -> Option<&FailureDetail> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, detail: FailureDetail) {
        self.error = Some(detail);
    }

    // --- open extension map ---

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whether the fire still carries raw, pre-ingestion structure.
    pub fn has_uningested_keys(&self) -> bool {
        self.pending || UNINGESTED_KEYS.iter().any(|k| self.extra.contains_key(*k))
    }

    /// Generic keyed assignment.
    ///
    /// Recognized keys go through the same validation as their typed setters;
    /// everything else lands in the extension map. The submitted record, if
    /// kept, receives the same value. A pending fire stores every key as is.
    pub fn set(&mut self, key: &str, value: Value) -> FireResult<()> {
        if key == "id" {
            let new_id = match &value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => return Err(FireError::invalid_field("id", other.to_string())),
            };
            if new_id != self.id {
                return Err(FireError::FireIdImmutable);
            }
            return Ok(());
        }

        if self.pending {
            if let Some(record) = self.submitted.as_mut() {
                record.insert(key.to_string(), value.clone());
            }
            self.extra.insert(key.to_string(), value);
            return Ok(());
        }

        let submitted = self.submitted.take();
        let result = self.set_field(key, value.clone());
        self.submitted = submitted;
        result?;
        if let Some(record) = self.submitted.as_mut() {
            record.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn set_field(&mut self, key: &str, value: Value) -> FireResult<()> {
        match key {
            "type" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| FireError::InvalidFireType(value.to_string()))?;
                self.set_type(s)?;
            }
            "fuel_type" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| FireError::InvalidFuelType(value.to_string()))?;
                self.fuel_type = s.parse()?;
            }
            "event_of" => {
                let event: Option<EventOf> = serde_json::from_value(value)
                    .map_err(|e| FireError::invalid_field("event_of", e.to_string()))?;
                self.set_event_of(event);
            }
            "meta" => match value {
                Value::Object(map) => self.meta = map,
                Value::Null => self.meta.clear(),
                other => return Err(FireError::invalid_field("meta", other.to_string())),
            },
            "growth" => {
                let growth: Vec<GrowthWindow> = serde_json::from_value(value)
                    .map_err(|e| FireError::invalid_field("growth", e.to_string()))?;
                self.set_growth(growth)?;
            }
            "error" => {
                let detail: Option<FailureDetail> = serde_json::from_value(value)
                    .map_err(|e| FireError::invalid_field("error", e.to_string()))?;
                self.error = detail;
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    // --- time span ---

    /// Earliest local start across growth windows.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.growth.iter().filter_map(|g| g.start).min()
    }

    /// Latest local end across growth windows.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.growth.iter().filter_map(|g| g.end).max()
    }

    pub fn start_utc(&self) -> Option<NaiveDateTime> {
        self.growth.iter().filter_map(GrowthWindow::start_utc).min()
    }

    pub fn end_utc(&self) -> Option<NaiveDateTime> {
        self.growth.iter().filter_map(GrowthWindow::end_utc).max()
    }
}
