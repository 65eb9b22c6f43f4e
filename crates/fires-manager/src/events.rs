//! Event names from a side file.
//!
//! Some feeds ship fire records that reference an event only by id, with
//! names kept in a separate list of `{"id": ..., "event_name": ...}` objects.

use std::collections::HashMap;

use fire_common::{Fire, FireError, FireResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct EventEntry {
    #[serde(default)]
    id: Value,
    event_name: Option<String>,
}

/// Event id to event name lookup.
#[derive(Debug, Clone, Default)]
pub struct EventNames {
    names: HashMap<String, String>,
}

impl EventNames {
    pub fn from_value(value: Value) -> FireResult<Self> {
        let entries: Vec<EventEntry> = serde_json::from_value(value)
            .map_err(|e| FireError::InvalidDocument(format!("invalid events list: {}", e)))?;

        let names = entries
            .into_iter()
            .filter_map(|entry| {
                let id = match entry.id {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                entry.event_name.map(|name| (id, name))
            })
            .collect();
        Ok(Self { names })
    }

    pub fn get(&self, event_id: &str) -> Option<&str> {
        self.names.get(event_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name raw fires by their event id. Names already present are kept.
    ///
    /// Returns the number of fires that were named.
    pub fn apply(&self, fires: &mut [Fire]) -> FireResult<usize> {
        let mut named = 0;
        for fire in fires.iter_mut() {
            if let Some(mut event) = fire.event_of().cloned() {
                if event.name.is_none() {
                    if let Some(name) = event.id.as_deref().and_then(|id| self.get(id)) {
                        event.name = Some(name.to_string());
                        fire.set("event_of", serde_json::to_value(&event)?)?;
                        named += 1;
                    }
                }
                continue;
            }

            let event_id = match fire.get_extra("event_id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if fire.get_extra("name").is_some() {
                continue;
            }
            if let Some(name) = self.get(&event_id) {
                debug!(fire_id = %fire.id(), event_id = %event_id, "Attached event name");
                fire.set("name", Value::String(name.to_string()))?;
                named += 1;
            }
        }
        Ok(named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names() -> EventNames {
        EventNames::from_value(json!([
            {"id": "SF11E826544", "event_name": "Rim Fire"},
            {"id": 42, "event_name": "Numbered"},
            {"id": "nameless"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_from_value() {
        let names = names();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("42"), Some("Numbered"));
        assert!(EventNames::from_value(json!({"id": 1})).is_err());
    }

    #[test]
    fn test_apply() {
        let mut fires = vec![
            Fire::from_value(json!({"id": "1", "event_id": "SF11E826544"})).unwrap(),
            Fire::from_value(json!({"id": "2", "event_of": {"id": "42"}})).unwrap(),
            Fire::from_value(json!({"id": "3", "event_id": "42", "name": "Kept"})).unwrap(),
            Fire::from_value(json!({"id": "4"})).unwrap(),
        ];
        assert_eq!(names().apply(&mut fires).unwrap(), 2);
        assert_eq!(fires[0].get_extra("name"), Some(&json!("Rim Fire")));
        assert_eq!(
            fires[1].event_of().and_then(|e| e.name.as_deref()),
            Some("Numbered")
        );
        assert_eq!(fires[2].get_extra("name"), Some(&json!("Kept")));
    }
}
