//! The ETL job: extract raw trade partitions, transform to the daily report,
//! load the report and the updated ledger back to object storage.
//!
//! One invocation is strictly sequential: reconcile (at construction) →
//! extract → transform → load. The transform runs fully in memory before any
//! write, so a failed run never leaves a partial report behind.

use crate::config::{JobConfig, SourceConfig, TargetConfig};
use crate::ledger::{self, Reconciliation, DATE_FORMAT};
use crate::report;
use crate::storage::{read_table, write_table, ObjectStore, StorageError};
use chrono::{Local, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;

/// Errors that terminate a run. Only ledger reads are recovered locally
/// (inside [`crate::ledger::dates_to_extract`]); everything else propagates.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("invalid date '{value}' in ledger")]
    InvalidLedgerDate { value: String },
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The ledger already covered the whole candidate window; nothing was
    /// extracted and nothing was written.
    NothingToDo,
    Completed {
        report_key: String,
        report_rows: usize,
        dates_processed: usize,
    },
}

/// A single ETL invocation against a source and a target bucket.
pub struct EtlJob<'a> {
    src_bucket: &'a dyn ObjectStore,
    trg_bucket: &'a dyn ObjectStore,
    ledger_key: String,
    src: SourceConfig,
    trg: TargetConfig,
    reconciliation: Reconciliation,
    report_floor: NaiveDate,
}

impl<'a> EtlJob<'a> {
    /// Reconciles pending dates against the ledger up front; the job then
    /// carries a fixed date list for its whole run. `today` is injected so
    /// the candidate window is deterministic under test.
    pub fn new(
        src_bucket: &'a dyn ObjectStore,
        trg_bucket: &'a dyn ObjectStore,
        job: &JobConfig,
        src: SourceConfig,
        trg: TargetConfig,
        today: NaiveDate,
    ) -> Self {
        let reconciliation =
            ledger::dates_to_extract(trg_bucket, &job.ledger_key, job.first_extract_date, today);
        log::info!(
            "{} date(s) pending extraction, effective min date {}",
            reconciliation.dates.len(),
            reconciliation.effective_min_date
        );

        Self {
            src_bucket,
            trg_bucket,
            ledger_key: job.ledger_key.clone(),
            src,
            trg,
            reconciliation,
            report_floor: job.first_extract_date,
        }
    }

    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }

    /// Read every object under the pending dates' prefixes into one raw
    /// table (schema union across files). Zero objects is an empty table,
    /// not an error; a failed read aborts the run.
    pub fn extract(&self) -> Result<DataFrame, EtlError> {
        let mut partitions: Vec<LazyFrame> = Vec::new();
        for date in &self.reconciliation.dates {
            let prefix = date.format(DATE_FORMAT).to_string();
            for key in self.src_bucket.list_keys(&prefix)? {
                partitions.push(read_table(self.src_bucket, &key)?.lazy());
            }
        }
        log::info!("extracting {} source object(s)", partitions.len());

        if partitions.is_empty() {
            return Ok(DataFrame::empty());
        }
        Ok(concat_lf_diagonal(partitions, UnionArgs::default())?.collect()?)
    }

    /// Aggregate the raw table into the daily report.
    pub fn transform(&self, raw: DataFrame) -> Result<DataFrame, EtlError> {
        Ok(report::build_daily_report(
            raw,
            &self.src,
            &self.trg,
            self.report_floor,
        )?)
    }

    /// Write the report under a load-time-stamped key, then append the
    /// processed dates to the ledger. The report write happens first, so a
    /// write failure leaves the ledger stale (safe to retry).
    pub fn load(&self, mut df: DataFrame, now: NaiveDateTime) -> Result<String, EtlError> {
        let key = format!(
            "{}{}{}",
            self.trg.key_prefix,
            now.format(&self.trg.key_date_format),
            self.trg.file_extension
        );
        write_table(self.trg_bucket, &mut df, &key)?;
        ledger::record_processed(
            self.trg_bucket,
            &self.ledger_key,
            &self.reconciliation.dates,
            now.date(),
        )?;
        Ok(key)
    }

    /// Run the whole pipeline once.
    pub fn run(&self) -> Result<RunOutcome, EtlError> {
        if self.reconciliation.is_empty() {
            log::info!("ledger covers the whole candidate window, nothing to do");
            return Ok(RunOutcome::NothingToDo);
        }

        let raw = self.extract()?;
        log::info!("extracted {} raw row(s)", raw.height());

        let daily_report = self.transform(raw)?;
        let report_rows = daily_report.height();

        let report_key = self.load(daily_report, Local::now().naive_local())?;
        log::info!("report written to '{report_key}' ({report_rows} row(s))");

        Ok(RunOutcome::Completed {
            report_key,
            report_rows,
            dates_processed: self.reconciliation.dates.len(),
        })
    }
}
