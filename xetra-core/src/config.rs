//! Typed job configuration, loaded from a single TOML file.
//!
//! Column names are configuration, not code: the transform never hardcodes
//! what the source files call their columns. The defaults match the canonical
//! Xetra export schema so a minimal config file only has to name the bucket
//! roots, the ledger key, and the first extraction date.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full configuration bundle for one ETL invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    pub storage: StorageConfig,
    pub job: JobConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub target: TargetConfig,
}

impl EtlConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Bucket locations for the run.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the bucket holding raw per-date trade partitions.
    pub source_root: PathBuf,
    /// Root of the bucket receiving the report and the ledger.
    pub target_root: PathBuf,
}

/// Per-run job parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Earliest date the report should cover (`YYYY-MM-DD`).
    pub first_extract_date: NaiveDate,
    /// Object key of the processing ledger in the target bucket.
    pub ledger_key: String,
}

/// Column mapping for the raw source files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Columns projected out of the raw files before aggregation.
    pub columns: Vec<String>,
    pub isin: String,
    pub date: String,
    pub time: String,
    pub start_price: String,
    pub min_price: String,
    pub max_price: String,
    pub traded_volume: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                "ISIN".into(),
                "Date".into(),
                "Time".into(),
                "StartPrice".into(),
                "MinPrice".into(),
                "MaxPrice".into(),
                "TradedVolume".into(),
            ],
            isin: "ISIN".into(),
            date: "Date".into(),
            time: "Time".into(),
            start_price: "StartPrice".into(),
            min_price: "MinPrice".into(),
            max_price: "MaxPrice".into(),
            traded_volume: "TradedVolume".into(),
        }
    }
}

/// Column names and object-key layout of the produced report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub isin: String,
    pub date: String,
    pub opening_price: String,
    pub closing_price: String,
    pub min_price: String,
    pub max_price: String,
    pub daily_traded_volume: String,
    pub change_prev_close: String,
    /// Report keys are `<key_prefix><timestamp><file_extension>`.
    pub key_prefix: String,
    /// chrono format string for the timestamp in the report key.
    pub key_date_format: String,
    /// Extension of the report object; selects the table encoding.
    pub file_extension: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            isin: "isin".into(),
            date: "date".into(),
            opening_price: "opening_price_eur".into(),
            closing_price: "closing_price_eur".into(),
            min_price: "minimum_price_eur".into(),
            max_price: "maximum_price_eur".into(),
            daily_traded_volume: "daily_traded_volume".into(),
            change_prev_close: "change_prev_closing_pct".into(),
            key_prefix: "xetra_daily_report_".into(),
            key_date_format: "%Y%m%d_%H%M%S".into(),
            file_extension: ".parquet".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_default_column_mapping() {
        let config = EtlConfig::from_toml(
            r#"
[storage]
source_root = "/data/src"
target_root = "/data/trg"

[job]
first_extract_date = "2022-01-01"
ledger_key = "meta/processed_dates.csv"
"#,
        )
        .unwrap();

        assert_eq!(
            config.job.first_extract_date,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert_eq!(config.source.isin, "ISIN");
        assert_eq!(config.source.columns.len(), 7);
        assert_eq!(config.target.file_extension, ".parquet");
    }

    #[test]
    fn partial_target_section_keeps_other_defaults() {
        let config = EtlConfig::from_toml(
            r#"
[storage]
source_root = "/data/src"
target_root = "/data/trg"

[job]
first_extract_date = "2022-01-01"
ledger_key = "meta/processed_dates.csv"

[target]
key_prefix = "reports/daily_"
file_extension = ".csv"
"#,
        )
        .unwrap();

        assert_eq!(config.target.key_prefix, "reports/daily_");
        assert_eq!(config.target.file_extension, ".csv");
        assert_eq!(config.target.opening_price, "opening_price_eur");
    }

    #[test]
    fn missing_job_section_is_an_error() {
        let result = EtlConfig::from_toml(
            r#"
[storage]
source_root = "/data/src"
target_root = "/data/trg"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
