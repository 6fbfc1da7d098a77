//! tsr-reconcile - Timesheet reconciliation CLI
//!
//! **Usage:**
//! ```bash
//! tsr-reconcile process --timesheet extracted.json --people team.json --projects projects.json
//! tsr-reconcile coverage --records records.jsonl --people team.json --month 2025-09
//! tsr-reconcile similarity "Neil Pomfret" "Niel Pomfret"
//! ```
//!
//! Reports are written to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tsr_common::config::{ConfigResolver, TomlConfig};
use tsr_common::models::RawTimesheet;
use tsr_common::week::ClarityMonth;
use tsr_common::{PersonRoster, Rosters};
use tsr_reconcile::coverage::{CoverageRecord, CoverageTracker};
use tsr_reconcile::similarity::{edit_distance, similarity_ratio};
use tsr_reconcile::TimesheetPipeline;

/// Timesheet reconciliation and identity resolution
#[derive(Parser, Debug)]
#[command(name = "tsr-reconcile")]
#[command(about = "Reconcile OCR-extracted timesheets against rosters", version)]
struct Args {
    /// Config file (overrides TSR_CONFIG and the default location)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate, reconcile and resolve one extracted timesheet
    Process {
        /// Extracted timesheet JSON
        #[arg(long, value_name = "FILE")]
        timesheet: PathBuf,

        /// Team roster JSON
        #[arg(long, value_name = "FILE")]
        people: Option<PathBuf>,

        /// Project roster JSON
        #[arg(long, value_name = "FILE")]
        projects: Option<PathBuf>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Submission coverage for one Clarity month
    Coverage {
        /// Processed timesheet records, one JSON object per line
        #[arg(long, value_name = "FILE")]
        records: PathBuf,

        /// Team roster JSON; defaults to everyone seen in the records
        #[arg(long, value_name = "FILE")]
        people: Option<PathBuf>,

        /// Clarity month as YYYY-MM (16th of the month to 15th of the next)
        #[arg(long)]
        month: String,
    },

    /// Similarity ratio and edit distance between two strings
    Similarity { first: String, second: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let config = resolver.resolve().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(config = ?resolver.config_path(), "Configuration loaded");

    match args.command {
        Command::Process {
            timesheet,
            people,
            projects,
            pretty,
        } => run_process(config, &timesheet, people.as_deref(), projects.as_deref(), pretty),
        Command::Coverage { records, people, month } => run_coverage(&records, people.as_deref(), &month),
        Command::Similarity { first, second } => {
            let report = serde_json::json!({
                "first": first,
                "second": second,
                "similarity_ratio": similarity_ratio(&first, &second),
                "edit_distance": edit_distance(&first, &second),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn run_process(
    config: TomlConfig,
    timesheet: &Path,
    people: Option<&Path>,
    projects: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(timesheet)
        .with_context(|| format!("Failed to read timesheet {}", timesheet.display()))?;
    let raw = RawTimesheet::from_json(&text)
        .with_context(|| format!("Failed to parse timesheet {}", timesheet.display()))?;
    let rosters = Rosters::load(people, projects).context("Failed to load rosters")?;

    info!(
        people = rosters.people.len(),
        projects = rosters.projects.len(),
        "Rosters loaded"
    );

    let pipeline = TimesheetPipeline::new(config);
    let report = pipeline
        .process(&raw, &rosters)
        .with_context(|| format!("Failed to process {}", timesheet.display()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}

fn run_coverage(records: &Path, people: Option<&Path>, month: &str) -> Result<()> {
    let month: ClarityMonth = month
        .parse()
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))?;

    let text = std::fs::read_to_string(records)
        .with_context(|| format!("Failed to read records {}", records.display()))?;
    let mut parsed = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CoverageRecord = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid coverage record", records.display(), number + 1))?;
        parsed.push(record);
    }

    let mut tracker = CoverageTracker::new();
    tracker.record_all(&parsed);

    let names: Vec<String> = match people {
        Some(path) => PersonRoster::load(path)
            .with_context(|| format!("Failed to load team roster {}", path.display()))?
            .members()
            .map(str::to_string)
            .collect(),
        None => {
            let mut seen: Vec<String> = parsed.iter().map(|r| r.person.trim().to_string()).collect();
            seen.sort();
            seen.dedup();
            seen
        }
    };

    let grid = tracker.month_grid(&names, month);
    info!(
        month = %month,
        people = names.len(),
        weeks = grid.weeks.len(),
        missing = grid.missing().len(),
        "Coverage computed"
    );
    println!("{}", serde_json::to_string_pretty(&grid)?);
    Ok(())
}
