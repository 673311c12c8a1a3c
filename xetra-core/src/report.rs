//! Daily report transform: one OHLC row per (instrument, date).
//!
//! Opening and closing prices are derived from the start price of the
//! earliest and latest intraday rows; the day-over-day change compares each
//! closing price against the previous calendar date's close for the same
//! instrument. Pure function of its inputs — no storage access.

use crate::config::{SourceConfig, TargetConfig};
use crate::ledger::DATE_FORMAT;
use chrono::NaiveDate;
use polars::prelude::*;

const PREV_CLOSE_COL: &str = "prev_closing_price";

/// Aggregate raw intraday trade rows into the daily per-instrument report.
///
/// `report_floor` trims the output to `date >= floor`: the extraction window
/// deliberately reaches one day further back than the requested start so the
/// first reported day still gets a previous close, and that slack day must
/// not appear in the report itself.
///
/// Rows with equal timestamps keep their input order (maintain-order sorts),
/// so the transform is deterministic. Numeric outputs are rounded to two
/// decimals (polars rounding, half away from zero); the traded volume is
/// integral and left as-is. A previous close of zero yields a non-finite
/// change value rather than an error, and the first date per instrument has
/// a null change.
pub fn build_daily_report(
    raw: DataFrame,
    src: &SourceConfig,
    trg: &TargetConfig,
    report_floor: NaiveDate,
) -> PolarsResult<DataFrame> {
    if raw.height() == 0 || raw.width() == 0 {
        return empty_report(trg);
    }

    let floor = report_floor.format(DATE_FORMAT).to_string();
    let projected: Vec<Expr> = src.columns.iter().map(|c| col(c.as_str())).collect();
    let rounded = [
        trg.opening_price.as_str(),
        trg.closing_price.as_str(),
        trg.min_price.as_str(),
        trg.max_price.as_str(),
        trg.change_prev_close.as_str(),
    ];
    let output: [&str; 8] = [
        trg.isin.as_str(),
        trg.date.as_str(),
        trg.opening_price.as_str(),
        trg.closing_price.as_str(),
        trg.min_price.as_str(),
        trg.max_price.as_str(),
        trg.daily_traded_volume.as_str(),
        trg.change_prev_close.as_str(),
    ];

    raw.lazy()
        .select(projected)
        .sort(
            [src.isin.as_str(), src.date.as_str(), src.time.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([
            col(src.isin.as_str()).alias(trg.isin.as_str()),
            col(src.date.as_str()).alias(trg.date.as_str()),
        ])
        .agg([
            col(src.start_price.as_str())
                .first()
                .alias(trg.opening_price.as_str()),
            col(src.start_price.as_str())
                .last()
                .alias(trg.closing_price.as_str()),
            col(src.min_price.as_str()).min().alias(trg.min_price.as_str()),
            col(src.max_price.as_str()).max().alias(trg.max_price.as_str()),
            col(src.traded_volume.as_str())
                .sum()
                .alias(trg.daily_traded_volume.as_str()),
        ])
        .sort(
            [trg.isin.as_str(), trg.date.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        // lag(1) within each instrument: the shift is valid only while the
        // instrument column matches its own predecessor
        .with_column(
            when(col(trg.isin.as_str()).shift(lit(1)).eq(col(trg.isin.as_str())))
                .then(col(trg.closing_price.as_str()).shift(lit(1)))
                .otherwise(lit(NULL))
                .alias(PREV_CLOSE_COL),
        )
        .with_column(
            ((col(trg.closing_price.as_str()) - col(PREV_CLOSE_COL)) / col(PREV_CLOSE_COL)
                * lit(100.0))
            .alias(trg.change_prev_close.as_str()),
        )
        .with_columns(rounded.iter().map(|c| col(*c).round(2)).collect::<Vec<_>>())
        .filter(col(trg.date.as_str()).gt_eq(lit(floor)))
        .select(output.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()
}

/// The report schema with zero rows, for runs that extracted nothing.
fn empty_report(trg: &TargetConfig) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::from(Series::new_empty(trg.isin.as_str().into(), &DataType::String)),
        Column::from(Series::new_empty(trg.date.as_str().into(), &DataType::String)),
        Column::from(Series::new_empty(
            trg.opening_price.as_str().into(),
            &DataType::Float64,
        )),
        Column::from(Series::new_empty(
            trg.closing_price.as_str().into(),
            &DataType::Float64,
        )),
        Column::from(Series::new_empty(
            trg.min_price.as_str().into(),
            &DataType::Float64,
        )),
        Column::from(Series::new_empty(
            trg.max_price.as_str().into(),
            &DataType::Float64,
        )),
        Column::from(Series::new_empty(
            trg.daily_traded_volume.as_str().into(),
            &DataType::Int64,
        )),
        Column::from(Series::new_empty(
            trg.change_prev_close.as_str().into(),
            &DataType::Float64,
        )),
    ])
}
