//! Processing ledger: which source dates have already been extracted.
//!
//! The ledger is a small CSV object in the target bucket with one row per
//! processed source date. Reconciliation diffs a candidate date window
//! against it so repeated runs only extract what prior runs missed. A
//! missing or corrupt ledger is never fatal — the job falls back to a
//! bootstrap window around the requested first date.

use crate::pipeline::EtlError;
use crate::storage::{read_table, write_table, ObjectStore, StorageError};
use chrono::{Duration, Months, NaiveDate};
use polars::prelude::*;
use std::collections::HashSet;

pub const SOURCE_DATE_COL: &str = "source_date";
pub const PROCESSED_AT_COL: &str = "datetime_of_processing";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentinel `effective_min_date` for "ledger already covers the window".
pub const NOTHING_TO_DO: NaiveDate = NaiveDate::MAX;

/// Result of diffing the candidate window against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Dates still needing extraction, ascending.
    pub dates: Vec<NaiveDate>,
    /// Smallest pending date, the requested first date in bootstrap mode, or
    /// [`NOTHING_TO_DO`] when nothing is pending.
    pub effective_min_date: NaiveDate,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Compute the dates a run still has to extract.
///
/// The candidate window is `[first_date - 1 day, today - 1 year]`: one day of
/// slack before the requested start absorbs late-arriving data (it feeds the
/// previous-close lookback and is trimmed from the report), and the one-year
/// horizon bounds backfill. Dates already in the ledger are skipped; only
/// dates strictly after the slack day are returned.
///
/// An unreadable ledger routes to bootstrap mode: the full range
/// `[first_date - 1, first_date + 1]` with `effective_min_date = first_date`.
/// The failure is logged, not propagated.
pub fn dates_to_extract(
    store: &dyn ObjectStore,
    ledger_key: &str,
    first_date: NaiveDate,
    today: NaiveDate,
) -> Reconciliation {
    let min_date = first_date - Duration::days(1);

    match read_ledger_dates(store, ledger_key) {
        Ok(processed) => {
            let horizon = today - Months::new(12);
            let missing: Vec<NaiveDate> = date_range(min_date, horizon)
                .into_iter()
                .filter(|d| *d > min_date && !processed.contains(d))
                .collect();

            match missing.first().copied() {
                Some(first) => Reconciliation {
                    dates: missing,
                    effective_min_date: first,
                },
                None => Reconciliation {
                    dates: Vec::new(),
                    effective_min_date: NOTHING_TO_DO,
                },
            }
        }
        Err(err) => {
            log::warn!("ledger '{ledger_key}' unavailable ({err}); bootstrapping full window");
            Reconciliation {
                dates: date_range(min_date, first_date + Duration::days(1)),
                effective_min_date: first_date,
            }
        }
    }
}

/// Append freshly processed dates to the ledger, newest rows first.
///
/// If an existing ledger cannot be read the write degrades to just the new
/// rows. Prior entries are lost in that case; the path gets its own distinct
/// error log so operators can spot it.
pub fn record_processed(
    store: &dyn ObjectStore,
    ledger_key: &str,
    dates: &[NaiveDate],
    processed_on: NaiveDate,
) -> Result<(), EtlError> {
    let source_dates: Vec<String> = dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect();
    let processed_at = vec![processed_on.format(DATE_FORMAT).to_string(); dates.len()];

    let new_rows = df!(
        SOURCE_DATE_COL => source_dates,
        PROCESSED_AT_COL => processed_at,
    )?;

    let mut ledger = match read_table(store, ledger_key) {
        Ok(existing) => {
            concat_lf_diagonal(vec![new_rows.lazy(), existing.lazy()], UnionArgs::default())?
                .collect()?
        }
        Err(StorageError::ObjectNotFound { .. }) => {
            log::info!("no ledger at '{ledger_key}' yet, creating one");
            new_rows
        }
        Err(err) => {
            log::error!(
                "ledger '{ledger_key}' is unreadable and will be replaced; \
                 prior entries are lost: {err}"
            );
            new_rows
        }
    };

    write_table(store, &mut ledger, ledger_key)?;
    Ok(())
}

fn read_ledger_dates(
    store: &dyn ObjectStore,
    ledger_key: &str,
) -> Result<HashSet<NaiveDate>, EtlError> {
    let df = read_table(store, ledger_key)?;
    let dates = df.column(SOURCE_DATE_COL)?.str()?;

    let mut processed = HashSet::with_capacity(df.height());
    for value in dates.into_iter().flatten() {
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            EtlError::InvalidLedgerDate {
                value: value.to_string(),
            }
        })?;
        processed.insert(date);
    }
    Ok(processed)
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}
