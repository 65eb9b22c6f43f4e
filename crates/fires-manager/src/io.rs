//! Reading and writing fire documents.
//!
//! A document is a JSON object:
//!
//! ```json
//! {
//!   "fire_information": [ ... ],
//!   "run_id": "...",
//!   "today": "2016-04-20",
//!   "config": { ... },
//!   "processing": [ ... ],
//!   "any_other_key": "kept as metadata"
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use fire_common::time::format_datetime;
use fire_common::{Fire, FireError, FireResult};
use serde_json::{Map, Value};
use tracing::info;

use crate::manager::FiresManager;
use crate::VERSION;

pub const FIRES_KEY: &str = "fire_information";
pub const FAILED_FIRES_KEY: &str = "failed_fires";

/// Keys written on dump and recomputed on load.
const DERIVED_KEYS: &[&str] = &["counts", "version"];

impl FiresManager {
    /// Load a document from a JSON string.
    pub fn loads(&mut self, input: &str) -> FireResult<()> {
        let value: Value = serde_json::from_str(input)?;
        self.load(value)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> FireResult<()> {
        let input = fs::read_to_string(path.as_ref())?;
        self.loads(&input)
    }

    /// Load a document, replacing the fire collection.
    ///
    /// `config` is merged into the current configuration and every key the
    /// document does not reserve becomes metadata. A document without a
    /// run id leaves this manager with a generated one.
    pub fn load(&mut self, document: Value) -> FireResult<()> {
        let Value::Object(document) = document else {
            return Err(FireError::InvalidDocument(format!(
                "expected an object, got {}",
                document
            )));
        };

        let mut fires = Vec::new();
        for (key, value) in document {
            match key.as_str() {
                FIRES_KEY => fires = parse_fires(FIRES_KEY, value)?,
                FAILED_FIRES_KEY => {
                    let failed = parse_fires(FAILED_FIRES_KEY, value)?;
                    self.set_failed_fires((!failed.is_empty()).then_some(failed));
                }
                "config" => self.merge_config(value)?,
                "today" => match value {
                    Value::String(s) => self.set_today(&s)?,
                    Value::Null => {}
                    other => {
                        return Err(FireError::InvalidDocument(format!(
                            "'today' must be a string, got {}",
                            other
                        )))
                    }
                },
                "run_id" => match value {
                    Value::String(s) => self.load_run_id(s)?,
                    Value::Null => {}
                    other => {
                        return Err(FireError::InvalidDocument(format!(
                            "'run_id' must be a string, got {}",
                            other
                        )))
                    }
                },
                "processing" => match value {
                    Value::Array(records) => self.set_processing(records),
                    other => {
                        return Err(FireError::InvalidDocument(format!(
                            "'processing' must be a list, got {}",
                            other
                        )))
                    }
                },
                k if DERIVED_KEYS.contains(&k) => {}
                _ => {
                    self.meta_mut().insert(key, value);
                }
            }
        }

        // make sure a run id exists from here on
        self.run_id();

        info!(fires = fires.len(), run_id = %self.run_id(), "Loaded fires");
        self.set_fires(fires);
        Ok(())
    }

    /// A run id in a document may repeat the current one, but not replace it.
    fn load_run_id(&mut self, run_id: String) -> FireResult<()> {
        if self.has_run_id() && self.run_id() == run_id {
            return Ok(());
        }
        self.set_run_id(run_id)
    }

    /// Render the manager as a document.
    pub fn dump(&self) -> FireResult<Value> {
        let mut document = self.meta().clone();

        let today = self.today();
        let today = if today.time() == NaiveTime::MIN {
            today.format("%Y-%m-%d").to_string()
        } else {
            format_datetime(&today)
        };
        document.insert("today".to_string(), Value::String(today));
        document.insert("run_id".to_string(), Value::String(self.run_id().to_string()));
        document.insert("config".to_string(), Value::Object(self.config().clone()));

        let fires = self
            .fires()
            .iter()
            .map(|f| f.to_map().map(Value::Object))
            .collect::<FireResult<Vec<_>>>()?;
        document.insert(FIRES_KEY.to_string(), Value::Array(fires));

        let mut counts = Map::new();
        counts.insert("fires".to_string(), Value::from(self.num_fires()));
        if let Some(failed) = self.failed_fires() {
            let failed_docs = failed
                .iter()
                .map(|f| f.to_map().map(Value::Object))
                .collect::<FireResult<Vec<_>>>()?;
            counts.insert("failed_fires".to_string(), Value::from(failed.len()));
            document.insert(FAILED_FIRES_KEY.to_string(), Value::Array(failed_docs));
        }

        document.insert(
            "processing".to_string(),
            Value::Array(self.processing().to_vec()),
        );
        document.insert("counts".to_string(), Value::Object(counts));
        document.insert("version".to_string(), Value::String(VERSION.to_string()));
        Ok(Value::Object(document))
    }

    pub fn dumps(&self) -> FireResult<String> {
        Ok(serde_json::to_string_pretty(&self.dump()?)?)
    }

    pub fn dump_file(&self, path: impl AsRef<Path>) -> FireResult<()> {
        fs::write(path.as_ref(), self.dumps()?)?;
        info!(path = %path.as_ref().display(), fires = self.num_fires(), "Wrote fires");
        Ok(())
    }
}

/// Records are kept as submitted; problems with their content surface when
/// they are ingested, one fire at a time.
fn parse_fires(key: &str, value: Value) -> FireResult<Vec<Fire>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(FireError::InvalidDocument(format!(
                "'{}' must be a list, got {}",
                key, other
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(Fire::from_submitted(record)),
            other => Err(FireError::InvalidDocument(format!(
                "each of '{}' must be an object, got {}",
                key, other
            ))),
        })
        .collect()
}
