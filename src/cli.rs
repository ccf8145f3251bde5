use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tablespec::config::Settings;
use tablespec::extract::extract_payload;
use tablespec::patterns;
use tablespec::pipeline::{TableRegistry, ValidationError, validate_semantics_with, validate_structure};

#[derive(Parser)]
#[command(
    name = "tablespec",
    version,
    about = "Validate tabular pipeline specs and profile sample data"
)]
pub struct Cli {
    /// Path to a JSON settings file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write daily-rotated log files to this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a pipeline spec, printing every error found
    Validate {
        /// Pipeline spec (JSON)
        pipeline: PathBuf,

        /// Table registry: a JSON object mapping table names to column lists.
        /// Without it only the structure of the pipeline is checked.
        #[arg(short, long)]
        tables: Option<PathBuf>,

        /// Recover the pipeline from surrounding prose or a fenced block
        #[arg(long)]
        lenient: bool,
    },
    /// Detect column patterns in sample data and suggest cleanups
    Detect {
        /// Sample data: `{"headers": [...], "rows": [[...], ...]}`
        data: PathBuf,
    },
    /// Print the first JSON object embedded in a text file
    Extract {
        /// Text file to search
        file: PathBuf,
    },
}

/// Row-major sample table read by `detect`
#[derive(Deserialize)]
struct SampleTable {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

pub fn run_command(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Validate {
            pipeline,
            tables,
            lenient,
        } => handle_validate(&pipeline, tables.as_deref(), lenient, settings),
        Commands::Detect { data } => handle_detect(&data, settings),
        Commands::Extract { file } => handle_extract(&file),
    }
}

fn handle_validate(
    path: &Path,
    tables: Option<&Path>,
    lenient: bool,
    settings: &Settings,
) -> Result<()> {
    let text = read(path)?;
    let doc: Value = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(_) if lenient => extract_payload(&text)
            .with_context(|| format!("No JSON object found in {}", path.display()))?,
        Err(e) => {
            return Err(e).with_context(|| format!("{} is not valid JSON", path.display()));
        }
    };

    let spec = match validate_structure(&doc) {
        Ok(spec) => spec,
        Err(errors) => return reject(&errors),
    };

    if let Some(tables) = tables {
        let registry: TableRegistry = serde_json::from_str(&read(tables)?)
            .with_context(|| format!("Failed to parse table registry {}", tables.display()))?;
        let errors = validate_semantics_with(&spec, &registry, &settings.validator);
        if !errors.is_empty() {
            return reject(&errors);
        }
    } else {
        tracing::info!("no table registry given; column references were not checked");
    }

    println!("OK: pipeline with {} step(s) is valid", spec.steps.len());
    Ok(())
}

fn reject(errors: &[ValidationError]) -> Result<()> {
    for error in errors {
        let phase = if error.is_structural() {
            "structure"
        } else {
            "reference"
        };
        println!("[{phase}] {error}");
    }
    bail!("pipeline rejected with {} error(s)", errors.len())
}

fn handle_detect(path: &Path, settings: &Settings) -> Result<()> {
    let table: SampleTable = serde_json::from_str(&read(path)?)
        .with_context(|| format!("Failed to parse sample data {}", path.display()))?;

    let report = patterns::analyse(&table.rows, &table.headers, &settings.detector);
    tracing::info!(
        columns = report.patterns.len(),
        suggestions = report.suggestions.len(),
        "detection finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle_extract(path: &Path) -> Result<()> {
    let text = read(path)?;
    let Some(payload) = extract_payload(&text) else {
        bail!("No JSON object found in {}", path.display());
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
