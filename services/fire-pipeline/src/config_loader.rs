//! Configuration loader for the fire pipeline.
//!
//! Loads YAML (or JSON) run configuration files of the form:
//!
//! ```yaml
//! modules: [ingestion, merge, filter]
//! config:
//!   skip_failed_fires: true
//!   filter:
//!     area:
//!       min: ${MIN_AREA:-10}
//! ```
//!
//! Supports environment variable substitution using ${VAR} syntax.
//! Date tokens such as `{today}` are left for the fires manager to resolve.

use anyhow::{Context, Result};
use fires_manager::EventNames;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

// ============================================================================
// Run Configuration File
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfigFile {
    /// Stages to run, in order. Empty means "use the command line".
    #[serde(default)]
    pub modules: Vec<String>,

    /// Reference day, e.g. "2016-04-20" or "{yesterday}".
    #[serde(default)]
    pub today: Option<String>,

    /// Run configuration merged into the fires manager.
    #[serde(default)]
    pub config: Map<String, Value>,
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse a run configuration file with environment variable substitution
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfigFile> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read run config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;
    parse_run_config(&expanded)
        .with_context(|| format!("Failed to parse run config from {:?}", path.as_ref()))
}

/// Parse run configuration text. YAML is a superset of JSON, so both work.
pub fn parse_run_config(content: &str) -> Result<RunConfigFile> {
    if content.trim().is_empty() {
        return Ok(RunConfigFile::default());
    }
    let config: RunConfigFile =
        serde_yaml::from_str(content).with_context(|| "Invalid run config YAML")?;
    validate_run_config(&config)?;
    Ok(config)
}

/// Load an event names file: a JSON list of `{"id", "event_name"}` objects.
pub fn load_event_names<P: AsRef<Path>>(path: P) -> Result<EventNames> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read events from {:?}", path.as_ref()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse events from {:?}", path.as_ref()))?;

    Ok(EventNames::from_value(value)?)
}

// ============================================================================
// Command Line Overrides
// ============================================================================

/// Parse a `section.key=value` override into its key path and value.
///
/// The value is read as JSON when it parses as JSON (numbers, booleans,
/// lists, quoted strings), otherwise it is taken as a plain string.
pub fn parse_config_override(arg: &str) -> Result<(Vec<String>, Value)> {
    let (path, raw) = arg
        .split_once('=')
        .with_context(|| format!("Config override must look like 'key.path=value', got {:?}", arg))?;

    let keys: Vec<String> = path.split('.').map(|k| k.trim().to_string()).collect();
    anyhow::ensure!(
        keys.iter().all(|k| !k.is_empty()),
        "Config override has an empty key: {:?}",
        arg
    );

    let value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((keys, value))
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in configuration content
/// Supports ${VAR} and ${VAR:-default} syntax
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            let value = resolve_var_expr(&var_expr)?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_run_config(config: &RunConfigFile) -> Result<()> {
    for module in &config.modules {
        anyhow::ensure!(!module.trim().is_empty(), "Module names cannot be empty");
    }
    if let Some(today) = &config.today {
        anyhow::ensure!(!today.trim().is_empty(), "'today' cannot be empty");
    }
    Ok(())
}
