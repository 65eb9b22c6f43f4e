//! Record ingester.
//!
//! Converts one raw fire record, in any of the supported input shapes, into a
//! canonical [`Fire`]. The raw input is relocated wholesale and returned as the
//! audit record; only recognized fields are read back out of it.

use fire_common::time::parse_datetime;
use fire_common::{
    BaseLocation, EventOf, Fire, FireError, FireResult, GrowthWindow, Location,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::IngestionConfig;
use crate::date_time::DateTimeParser;
use crate::raw::{self, truthy, RawRecord};
use crate::reconcile::{FireDraft, StructureReconciler};

/// Top-level scalar fields copied straight back onto the fire.
pub const SCALAR_FIELDS: &[&str] = &["id", "type", "fuel_type"];

/// Growth window keys carried over from raw growth entries as-is.
pub const PASSTHROUGH_GROWTH_FIELDS: &[&str] = &["localmet", "timeprofile", "plumerise"];

const BASE_LOCATION_FIELDS: [&str; 4] = ["geojson", "latitude", "longitude", "area"];

type Handler = fn(&FireIngester, &RawRecord<'_>, &mut FireDraft) -> FireResult<()>;

/// Handlers for nested objects, run first and in this order.
const NESTED_HANDLERS: &[(&str, Handler)] = &[
    ("location", FireIngester::ingest_location),
    ("event_of", FireIngester::ingest_event_of),
    ("growth", FireIngester::ingest_growth),
    ("fuelbeds", FireIngester::ingest_fuelbeds),
    ("meta", FireIngester::ingest_meta),
];

/// Handlers for special fields. They read, and may synthesize, what the
/// nested handlers produced, so they always run after them.
const SPECIAL_HANDLERS: &[(&str, Handler)] = &[("date_time", FireIngester::ingest_date_time)];

/// Normalizes raw fire records.
#[derive(Debug, Clone)]
pub struct FireIngester {
    config: IngestionConfig,
    date_time: DateTimeParser,
}

impl FireIngester {
    pub fn new(config: IngestionConfig) -> FireResult<Self> {
        Ok(Self {
            config,
            date_time: DateTimeParser::new()?,
        })
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Ingest a fire in place, returning its raw input: the record as
    /// submitted when the fire still has it.
    ///
    /// On error the fire is left exactly as it was.
    pub fn ingest(&self, fire: &mut Fire) -> FireResult<Map<String, Value>> {
        let raw = match fire.submitted() {
            Some(record) => record.clone(),
            None => fire.to_map()?,
        };
        let (ingested, raw) = self.ingest_record(raw)?;
        *fire = ingested;
        Ok(raw)
    }

    /// Ingest one raw record, returning the canonical fire and the raw input.
    pub fn ingest_record(
        &self,
        raw: Map<String, Value>,
    ) -> FireResult<(Fire, Map<String, Value>)> {
        if raw.is_empty() {
            return Err(FireError::NoData);
        }

        let record = RawRecord::new(&raw);
        let mut draft = FireDraft::new(self.scalar_fields(&record)?);

        for (name, handler) in NESTED_HANDLERS.iter().chain(SPECIAL_HANDLERS) {
            handler(self, &record, &mut draft)?;
            debug!(fire_id = %draft.fire.id(), handler = %name, "Ingested field");
        }

        StructureReconciler::new(
            &self.config.location_fields,
            self.config.fuelbed_pct_tolerance,
        )
        .process(&mut draft)?;

        let fire = draft.into_fire()?;
        Ok((fire, raw))
    }

    fn scalar_fields(&self, record: &RawRecord<'_>) -> FireResult<Fire> {
        let mut fire = match raw::text(record.get("id")) {
            Some(id) => Fire::with_id(id),
            None => Fire::new(),
        };
        for key in SCALAR_FIELDS.iter().filter(|k| **k != "id") {
            if let Some(value) = record.get(key) {
                fire.set(key, value.clone())?;
            }
        }
        Ok(fire)
    }

    // --- nested handlers ---

    fn ingest_location(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        let geojson = raw::geometry(record.field("geojson", "location"))?;
        let latitude = raw::number("latitude", record.field("latitude", "location"))?;
        let longitude = raw::number("longitude", record.field("longitude", "location"))?;
        let area = raw::number("area", record.field("area", "location"))?;

        let mut location = BaseLocation::resolve(geojson.as_ref(), latitude, longitude, area)
            .map(BaseLocation::into_location)
            .unwrap_or_default();
        for name in self.config.location_fields.iter() {
            if let Some(value) = record.field(name, "location") {
                location.set_field(name, value.clone());
            }
        }

        draft.location = location;
        Ok(())
    }

    fn ingest_event_of(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        let section = record.section("event_of");
        let nested = |key: &str| section.and_then(|s| s.get(key)).filter(|v| truthy(v));

        let event = EventOf {
            name: raw::text(record.field("name", "event_of").filter(|v| truthy(v))),
            id: raw::text(nested("id").or_else(|| record.get_truthy("event_id"))),
            url: raw::text(nested("url").or_else(|| record.get_truthy("event_url"))),
            extra: Map::new(),
        };
        draft.fire.set_event_of(Some(event));
        Ok(())
    }

    fn ingest_growth(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        let mut growth = Vec::new();

        match record.get_truthy("growth") {
            None => {
                // no growth list; a top-level start/end pair spans one window
                let start = record.get_truthy("start");
                let end = record.get_truthy("end");
                if start.is_some() && end.is_some() {
                    let mut window = GrowthWindow {
                        pct: Some(100.0),
                        ..GrowthWindow::default()
                    };
                    self.apply_growth_fields(&mut window, record.as_map())?;
                    growth.push(window);
                }
            }
            Some(Value::Array(entries)) => {
                for entry in entries {
                    let entry = entry.as_object().ok_or_else(|| {
                        FireError::invalid_field("growth", format!("expected an object, got {}", entry))
                    })?;
                    let mut window = GrowthWindow::default();
                    self.apply_growth_fields(&mut window, entry)?;
                    window.location = self.growth_location(entry)?;
                    window.fuelbeds = raw::fuelbeds(entry.get("fuelbeds"))?;
                    growth.push(window);
                }
            }
            Some(other) => {
                return Err(FireError::invalid_field(
                    "growth",
                    format!("expected a list, got {}", other),
                ))
            }
        }

        if growth.len() == 1 && growth[0].pct.is_none() {
            growth[0].pct = Some(100.0);
        }
        draft.growth = growth;
        Ok(())
    }

    fn ingest_fuelbeds(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        draft.fuelbeds = raw::fuelbeds(record.get("fuelbeds"))?;
        Ok(())
    }

    fn ingest_meta(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        match record.get_truthy("meta") {
            None => Ok(()),
            Some(Value::Object(meta)) => {
                *draft.fire.meta_mut() = meta.clone();
                Ok(())
            }
            Some(other) => Err(FireError::invalid_field(
                "meta",
                format!("expected an object, got {}", other),
            )),
        }
    }

    // --- special handlers ---

    fn ingest_date_time(&self, record: &RawRecord<'_>, draft: &mut FireDraft) -> FireResult<()> {
        let has_offset = draft.location.field("utc_offset").map_or(false, truthy);
        if has_offset && !draft.growth.is_empty() {
            return Ok(());
        }
        let Some(value) = record.get_truthy("date_time") else {
            return Ok(());
        };
        let Some(date_time) = value.as_str() else {
            warn!(fire_id = %draft.fire.id(), date_time = %value, "Failed to parse 'date_time' value");
            return Ok(());
        };

        match self.date_time.parse(date_time) {
            Ok(Some(parsed)) => {
                if draft.growth.is_empty() {
                    // assumed local and 24 hours long
                    draft.growth.push(GrowthWindow {
                        start: Some(parsed.start),
                        end: Some(parsed.end()),
                        pct: Some(100.0),
                        ..GrowthWindow::default()
                    });
                }
                if let (Some(offset), false) = (parsed.utc_offset, has_offset) {
                    draft.location.set_field("utc_offset", Value::String(offset));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    fire_id = %draft.fire.id(),
                    date_time = %date_time,
                    error = %e,
                    "Failed to parse 'date_time' value"
                );
            }
        }
        Ok(())
    }

    // --- helpers ---

    fn apply_growth_fields(
        &self,
        window: &mut GrowthWindow,
        source: &Map<String, Value>,
    ) -> FireResult<()> {
        let given = |key: &str| source.get(key).filter(|v| truthy(v));

        if let Some(start) = given("start") {
            window.start = Some(growth_time("start", start)?);
        }
        if let Some(end) = given("end") {
            window.end = Some(growth_time("end", end)?);
        }
        if let Some(pct) = raw::number("pct", given("pct"))? {
            window.pct = Some(pct);
        }
        for &key in PASSTHROUGH_GROWTH_FIELDS {
            if let Some(value) = given(key) {
                window.extra.insert(key.to_string(), value.clone());
            }
        }
        Ok(())
    }

    /// Location of one raw growth entry. Fields may sit on the entry itself
    /// or under its `location` object.
    fn growth_location(&self, entry: &Map<String, Value>) -> FireResult<Option<Location>> {
        let [geojson, latitude, longitude, area] =
            BASE_LOCATION_FIELDS.map(|f| raw::entry_field(entry, f));

        let geojson = raw::geometry(geojson)?;
        let mut location = BaseLocation::resolve(
            geojson.as_ref(),
            raw::number("latitude", latitude)?,
            raw::number("longitude", longitude)?,
            raw::number("area", area)?,
        )
        .map(BaseLocation::into_location)
        .unwrap_or_default();

        for name in self.config.location_fields.iter() {
            if let Some(value) = raw::entry_field(entry, name) {
                location.set_field(name, value.clone());
            }
        }

        Ok(if location.is_empty() { None } else { Some(location) })
    }
}

fn growth_time(field: &str, value: &Value) -> FireResult<chrono::NaiveDateTime> {
    let s = value
        .as_str()
        .ok_or_else(|| FireError::invalid_field(field, format!("{} is not a timestamp", value)))?;
    parse_datetime(s).map_err(|e| FireError::invalid_field(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ingester() -> FireIngester {
        FireIngester::new(IngestionConfig::default()).unwrap()
    }

    fn ingest(value: Value) -> FireResult<Fire> {
        let raw = value.as_object().cloned().unwrap_or_default();
        ingester().ingest_record(raw).map(|(fire, _)| fire)
    }

    #[test]
    fn test_empty_record() {
        assert!(matches!(ingest(json!({})), Err(FireError::NoData)));
    }

    #[test]
    fn test_handler_order() {
        let names: Vec<&str> = NESTED_HANDLERS
            .iter()
            .chain(SPECIAL_HANDLERS)
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            names,
            vec!["location", "event_of", "growth", "fuelbeds", "meta", "date_time"]
        );
    }

    #[test]
    fn test_scalar_fields_copied_back() {
        let fire = ingest(json!({
            "id": "abc", "type": "Rx", "fuel_type": "activity",
            "latitude": 45.0, "longitude": -120.0, "area": 10
        }))
        .unwrap();
        assert_eq!(fire.id(), "abc");
        assert_eq!(fire.fire_type().as_str(), "rx");
        assert_eq!(fire.fuel_type().as_str(), "activity");
        assert!(fire.extra().is_empty());
    }

    #[test]
    fn test_event_synonyms() {
        let fire = ingest(json!({
            "event_id": "SF11E826544", "name": "Natural Fire near Yosemite, CA",
            "event_url": "http://example.com", "latitude": 45.0, "longitude": -120.0, "area": 10
        }))
        .unwrap();
        let event = fire.event_of().unwrap();
        assert_eq!(event.id.as_deref(), Some("SF11E826544"));
        assert_eq!(event.name.as_deref(), Some("Natural Fire near Yosemite, CA"));
        assert_eq!(event.url.as_deref(), Some("http://example.com"));

        // nested values win
        let fire = ingest(json!({
            "event_of": {"id": "nested"}, "event_id": "top",
            "latitude": 45.0, "longitude": -120.0, "area": 10
        }))
        .unwrap();
        assert_eq!(fire.event_of().and_then(|e| e.id.as_deref()), Some("nested"));
    }

    #[test]
    fn test_start_end_synthesizes_window() {
        let fire = ingest(json!({
            "start": "2015-01-20T19:00:00", "end": "2015-01-21T19:00:00",
            "latitude": 25.041, "longitude": -77.379, "area": 100
        }))
        .unwrap();
        assert_eq!(fire.growth().len(), 1);
        assert_eq!(fire.growth()[0].area(), Some(100.0));
        assert_eq!(fire.growth()[0].pct, None);
    }

    #[test]
    fn test_per_growth_fuelbeds() {
        let fire = ingest(json!({
            "growth": [{
                "start": "2015-01-20T19:00:00", "end": "2015-01-21T19:00:00",
                "location": {"latitude": 25.0, "longitude": -77.0, "area": 10},
                "fuelbeds": [{"fccs_id": 1, "pct": 40}, {"fccs_id": 2, "pct": 60}]
            }]
        }))
        .unwrap();
        assert_eq!(fire.growth()[0].fuelbeds.len(), 2);
    }

    #[test]
    fn test_date_time_failure_is_not_fatal() {
        let fire = ingest(json!({
            "date_time": "201413290000Z",
            "latitude": 25.0, "longitude": -77.0, "area": 10
        }))
        .unwrap();
        assert_eq!(fire.growth()[0].start, None);
    }

    #[test]
    fn test_date_time_keeps_existing_offset() {
        let fire = ingest(json!({
            "date_time": "201508040000-04:00",
            "latitude": 25.0, "longitude": -77.0, "area": 10, "utc_offset": "-05:00"
        }))
        .unwrap();
        let window = &fire.growth()[0];
        assert_eq!(window.start, parse_datetime("2015-08-04T00:00:00").ok());
        assert_eq!(
            window.location.as_ref().and_then(|l| l.field("utc_offset")),
            Some(&json!("-05:00"))
        );
    }

    #[test]
    fn test_ingest_in_place_leaves_fire_on_error() {
        let mut fire = Fire::from_value(json!({"id": "1", "growth": [{}]})).unwrap();
        let before = fire.clone();
        assert!(ingester().ingest(&mut fire).is_err());
        assert_eq!(fire, before);
    }
}
