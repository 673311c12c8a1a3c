//! Property tests for the reconciler and the report transform.

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use proptest::prelude::*;
use xetra_core::ledger::{dates_to_extract, DATE_FORMAT, NOTHING_TO_DO};
use xetra_core::report::build_daily_report;
use xetra_core::{MemoryBucket, SourceConfig, TargetConfig};

const LEDGER_KEY: &str = "meta/processed_dates.csv";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

/// Candidate window for `first_date = 2022-01-01`, `today = 2023-01-05`:
/// `[2021-12-31, 2022-01-05]`, six days.
fn candidate_window() -> Vec<NaiveDate> {
    (0..6)
        .map(|d| date("2021-12-31") + Duration::days(d))
        .collect()
}

fn seed_ledger(bucket: &MemoryBucket, dates: &[NaiveDate]) {
    let mut text = String::from("source_date,datetime_of_processing\n");
    for d in dates {
        text.push_str(&format!("{},2022-06-01\n", d.format(DATE_FORMAT)));
    }
    bucket.insert(LEDGER_KEY, text.into_bytes());
}

proptest! {
    /// Whatever subset of the window the ledger holds, the reconciler
    /// returns exactly the uncovered dates strictly after the slack day,
    /// ascending.
    #[test]
    fn reconciler_returns_exactly_the_uncovered_dates(mask in prop::collection::vec(any::<bool>(), 6)) {
        let window = candidate_window();
        let min_date = date("2021-12-31");

        let in_ledger: Vec<NaiveDate> = window
            .iter()
            .zip(&mask)
            .filter(|(_, covered)| **covered)
            .map(|(d, _)| *d)
            .collect();

        let bucket = MemoryBucket::new();
        seed_ledger(&bucket, &in_ledger);

        let rec = dates_to_extract(&bucket, LEDGER_KEY, date("2022-01-01"), date("2023-01-05"));

        let expected: Vec<NaiveDate> = window
            .iter()
            .filter(|d| **d > min_date && !in_ledger.contains(d))
            .copied()
            .collect();

        prop_assert_eq!(&rec.dates, &expected);
        prop_assert!(rec.dates.iter().all(|d| *d > min_date));
        prop_assert!(rec.dates.windows(2).all(|w| w[0] < w[1]));

        match expected.first() {
            Some(first) => prop_assert_eq!(rec.effective_min_date, *first),
            None => prop_assert_eq!(rec.effective_min_date, NOTHING_TO_DO),
        }
    }

    /// The transform is deterministic and produces one row per distinct
    /// (instrument, date) pair at or after the floor.
    #[test]
    fn transform_is_deterministic_with_one_row_per_group(
        rows in prop::collection::vec(
            (
                prop::sample::select(vec!["AT0000A0E9W5", "DE0005772206"]),
                0..3i64,
                prop::sample::select(vec!["09:00", "12:30", "17:00"]),
                1.0..500.0f64,
                1..10_000i64,
            ),
            1..24,
        )
    ) {
        let dates: Vec<String> = rows
            .iter()
            .map(|(_, day, ..)| (date("2022-01-01") + Duration::days(*day)).format(DATE_FORMAT).to_string())
            .collect();
        let raw = df!(
            "ISIN" => rows.iter().map(|(isin, ..)| isin.to_string()).collect::<Vec<_>>(),
            "Date" => dates.clone(),
            "Time" => rows.iter().map(|(_, _, time, ..)| time.to_string()).collect::<Vec<_>>(),
            "StartPrice" => rows.iter().map(|(.., price, _)| *price).collect::<Vec<_>>(),
            "MinPrice" => rows.iter().map(|(.., price, _)| price - 0.5).collect::<Vec<_>>(),
            "MaxPrice" => rows.iter().map(|(.., price, _)| price + 0.5).collect::<Vec<_>>(),
            "TradedVolume" => rows.iter().map(|(.., vol)| *vol).collect::<Vec<_>>(),
        )
        .unwrap();

        let src = SourceConfig::default();
        let trg = TargetConfig::default();
        let floor = date("2022-01-01");

        let first = build_daily_report(raw.clone(), &src, &trg, floor).unwrap();
        let second = build_daily_report(raw, &src, &trg, floor).unwrap();
        prop_assert!(first.equals_missing(&second));

        let mut groups: Vec<(String, String)> = rows
            .iter()
            .zip(&dates)
            .map(|((isin, ..), d)| (isin.to_string(), d.clone()))
            .collect();
        groups.sort();
        groups.dedup();
        prop_assert_eq!(first.height(), groups.len());
    }
}
