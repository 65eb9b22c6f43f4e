//! Fire pipeline command line tool.
//!
//! Reads a fire document, runs the ingestion, merge and filter stages over
//! it and writes the resulting document.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fire_pipeline::config_loader::parse_config_override;
use fire_pipeline::{load_event_names, load_run_config, parse_stages, Pipeline, DEFAULT_STAGES};
use fires_manager::FiresManager;

#[derive(Parser, Debug)]
#[command(name = "fire-pipeline")]
#[command(about = "Ingest, merge and filter wildfire records")]
struct Args {
    /// Input fire document (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (writes stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run configuration file(s), merged in order
    #[arg(short, long)]
    config: Vec<PathBuf>,

    /// Config overrides as key.path=value, applied after config files
    #[arg(short = 'C', long = "set")]
    overrides: Vec<String>,

    /// Comma separated stages to run
    #[arg(short, long, env = "FIRE_PIPELINE_MODULES")]
    modules: Option<String>,

    /// JSON list of {"id", "event_name"} used to name fires before ingestion
    #[arg(long)]
    events_file: Option<PathBuf>,

    /// Reference day: a date, a timestamp, or {today} / {yesterday} / {today-N}
    #[arg(long)]
    today: Option<String>,

    /// Run id for this run (generated when omitted)
    #[arg(long)]
    run_id: Option<String>,

    /// Set fires that fail ingestion aside instead of aborting
    #[arg(long)]
    skip_failed_fires: bool,

    /// Add an area-weighted fuelbed summary to the output
    #[arg(long)]
    summarize: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr; stdout may carry the output document
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fire pipeline");

    let mut manager = FiresManager::new()?;
    if let Some(run_id) = &args.run_id {
        manager.set_run_id(run_id.clone())?;
    }

    // Input document
    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input from {:?}", path))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read input from stdin")?;
            buf
        }
    };
    manager.loads(&input).context("Failed to load fire document")?;

    // Configuration: files, then overrides, then flags
    let mut file_modules = Vec::new();
    for path in &args.config {
        let run_config = load_run_config(path)?;
        if !run_config.modules.is_empty() {
            file_modules = run_config.modules;
        }
        if let Some(today) = &run_config.today {
            manager.set_today(today)?;
        }
        manager.merge_config(Value::Object(run_config.config))?;
        info!(path = %path.display(), "Loaded run config");
    }

    for arg in &args.overrides {
        let (keys, value) = parse_config_override(arg)?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        manager.set_config_value(value, &keys)?;
    }

    if args.skip_failed_fires {
        manager.set_config_value(Value::Bool(true), &["skip_failed_fires"])?;
    }
    if let Some(today) = &args.today {
        manager.set_today(today)?;
    }

    // Stages
    let stages = match &args.modules {
        Some(modules) => parse_stages(modules.split(','))?,
        None if !file_modules.is_empty() => parse_stages(&file_modules)?,
        None => DEFAULT_STAGES.to_vec(),
    };
    let mut pipeline = Pipeline::new(stages).with_summary(args.summarize);
    if let Some(path) = &args.events_file {
        pipeline = pipeline.with_events(load_event_names(path)?);
    }

    pipeline.run(&mut manager).context("Pipeline failed")?;

    match &args.output {
        Some(path) => manager.dump_file(path)?,
        None => println!("{}", manager.dumps()?),
    }

    Ok(())
}
