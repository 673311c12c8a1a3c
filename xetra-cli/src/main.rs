//! Xetra ETL CLI — run the daily report job or inspect pending dates.
//!
//! Commands:
//! - `run` — execute one extract → transform → load cycle
//! - `status` — show which source dates still need extraction (no writes)
//!
//! Logging goes through `env_logger`; set `RUST_LOG=info` to see the
//! pipeline's progress. Any failed run exits non-zero.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xetra_core::ledger::NOTHING_TO_DO;
use xetra_core::{EtlConfig, EtlJob, FsBucket, RunOutcome};

#[derive(Parser)]
#[command(name = "xetra", about = "Xetra daily report ETL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one ETL run from a TOML config file.
    Run {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Show pending source dates without extracting or writing anything.
    Status {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_etl(&config),
        Commands::Status { config } => show_status(&config),
    }
}

fn build_job(config_path: &Path) -> Result<(FsBucket, FsBucket, EtlConfig)> {
    let config = EtlConfig::from_file(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let src_bucket = FsBucket::new(&config.storage.source_root);
    let trg_bucket = FsBucket::new(&config.storage.target_root);
    Ok((src_bucket, trg_bucket, config))
}

fn run_etl(config_path: &Path) -> Result<()> {
    let (src_bucket, trg_bucket, config) = build_job(config_path)?;

    log::info!("ETL job started");
    let job = EtlJob::new(
        &src_bucket,
        &trg_bucket,
        &config.job,
        config.source,
        config.target,
        Local::now().date_naive(),
    );

    match job.run().context("ETL run failed")? {
        RunOutcome::NothingToDo => {
            println!("Nothing to do — the ledger is up to date.");
        }
        RunOutcome::Completed {
            report_key,
            report_rows,
            dates_processed,
        } => {
            println!("Report:          {report_key}");
            println!("Report rows:     {report_rows}");
            println!("Dates processed: {dates_processed}");
        }
    }
    log::info!("ETL job finished");
    Ok(())
}

fn show_status(config_path: &Path) -> Result<()> {
    let (src_bucket, trg_bucket, config) = build_job(config_path)?;

    let job = EtlJob::new(
        &src_bucket,
        &trg_bucket,
        &config.job,
        config.source,
        config.target,
        Local::now().date_naive(),
    );

    let rec = job.reconciliation();
    if rec.is_empty() {
        println!("Ledger is complete for the candidate window.");
        debug_assert_eq!(rec.effective_min_date, NOTHING_TO_DO);
        return Ok(());
    }

    println!(
        "{} pending date(s), effective min date {}:",
        rec.dates.len(),
        rec.effective_min_date
    );
    for date in &rec.dates {
        println!("  {date}");
    }
    Ok(())
}
