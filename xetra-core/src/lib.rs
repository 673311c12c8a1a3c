//! Xetra Core — incremental daily-report ETL for the Xetra trading dataset.
//!
//! This crate contains the whole pipeline:
//! - Object-storage capability interface (filesystem bucket + in-memory test double)
//! - CSV/Parquet table codec selected by object key extension
//! - Processing ledger reconciliation (which source dates still need a run)
//! - Per-instrument daily OHLC report transform with day-over-day change
//! - Linear extract → transform → load job driver

pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod report;
pub mod storage;

pub use config::{ConfigError, EtlConfig, JobConfig, SourceConfig, StorageConfig, TargetConfig};
pub use ledger::{dates_to_extract, record_processed, Reconciliation};
pub use pipeline::{EtlError, EtlJob, RunOutcome};
pub use storage::{FsBucket, MemoryBucket, ObjectStore, StorageError};
