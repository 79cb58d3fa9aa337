//! pox CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use pox_core::ObjectKind;
use pox_extract::sink::columnar::{EVENT_COLUMN, RUN_COLUMN};
use pox_extract::{ExtractorConfig, OutputConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "pox")]
#[command(about = "pox - physics-object extraction to Parquet / CSV tables")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an extraction job described by a YAML/JSON config file
    Run {
        /// Job config (`.json` → JSON, anything else → YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run an extraction job from command-line flags
    Extract {
        /// JSON-lines event files, read in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Candidate collection label read from every event
        #[arg(long)]
        collection: String,

        /// Object kind (muon, electron)
        #[arg(long, default_value = "muon")]
        object: ObjectKind,

        /// Output format (columnar, delimited)
        #[arg(long, default_value = "columnar")]
        format: OutputFormat,

        /// Output file. Defaults to `<Kind>ObjectInfo.<parquet|csv>`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Object slots per line (delimited output)
        #[arg(long, default_value = "5")]
        max_slots: usize,

        /// Rows per Parquet row group (columnar output)
        #[arg(long, default_value = "1024")]
        row_group_size: usize,

        /// Stop after this many events
        #[arg(long)]
        max_events: Option<usize>,
    },

    /// Summarize a Parquet object table
    Inspect {
        /// Parquet file written by `run`/`extract`
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Run { config } => cmd_run(&config),
        Commands::Extract {
            input,
            collection,
            object,
            format,
            output,
            max_slots,
            row_group_size,
            max_events,
        } => {
            let cfg = ExtractorConfig {
                input_collection: collection,
                object,
                inputs: input,
                max_events,
                output: OutputConfig { format, path: output, max_slots, row_group_size },
            };
            run_and_report(&cfg)
        }
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

fn cmd_run(config: &Path) -> Result<()> {
    let cfg = pox_extract::read_config(config)
        .with_context(|| format!("failed to read config {}", config.display()))?;
    run_and_report(&cfg)
}

fn run_and_report(cfg: &ExtractorConfig) -> Result<()> {
    let report = pox_extract::run_job(cfg).context("extraction failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!(
        "Wrote {} rows ({} events) → {}",
        report.summary.rows_written,
        report.summary.events,
        report.output.display()
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct InspectReport {
    path: PathBuf,
    object: ObjectKind,
    input_collection: String,
    events: usize,
    objects: usize,
    columns: Vec<String>,
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let table = pox_extract::read_object_table(path)
        .with_context(|| format!("failed to read object table {}", path.display()))?;

    let mut columns = vec![RUN_COLUMN.to_string(), EVENT_COLUMN.to_string()];
    columns.push(table.kind.count_column().to_string());
    columns.extend(
        pox_extract::Attribute::columnar_layout(table.kind)
            .iter()
            .map(|a| a.column_name(table.kind)),
    );

    let report = InspectReport {
        path: path.to_path_buf(),
        object: table.kind,
        input_collection: table.input_collection.clone(),
        events: table.rows.len(),
        objects: table.total_objects(),
        columns,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
