//! Table codec: dataframes in and out of a bucket, keyed by extension.
//!
//! `.csv` is delimited UTF-8 text with a header row, `.parquet` is columnar
//! binary. A write to a key with any other extension is skipped with a logged
//! error rather than failing the run — the skip is observable behavior the
//! rest of the pipeline relies on (the ledger update still happens).

use super::{ObjectStore, StorageError};
use polars::prelude::*;
use std::io::Cursor;

/// Supported table encodings, selected by the object key's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_key(key: &str) -> Option<Self> {
        let (_, ext) = key.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Read one object and decode it as a table.
pub fn read_table(store: &dyn ObjectStore, key: &str) -> Result<DataFrame, StorageError> {
    let bytes = store.read_bytes(key)?;
    let decode = |e: PolarsError| StorageError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    };

    match TableFormat::from_key(key) {
        Some(TableFormat::Csv) => CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(decode),
        Some(TableFormat::Parquet) => ParquetReader::new(Cursor::new(bytes))
            .finish()
            .map_err(decode),
        None => Err(StorageError::Decode {
            key: key.to_string(),
            message: "unrecognized table extension".into(),
        }),
    }
}

/// Encode a table and store it under `key`.
///
/// Unknown extension: logs an error and writes nothing.
pub fn write_table(
    store: &dyn ObjectStore,
    df: &mut DataFrame,
    key: &str,
) -> Result<(), StorageError> {
    let encode = |e: PolarsError| StorageError::Write {
        key: key.to_string(),
        message: e.to_string(),
    };

    let mut buf = Vec::new();
    match TableFormat::from_key(key) {
        Some(TableFormat::Csv) => {
            CsvWriter::new(&mut buf)
                .include_header(true)
                .finish(df)
                .map_err(encode)?;
        }
        Some(TableFormat::Parquet) => {
            ParquetWriter::new(&mut buf).finish(df).map_err(encode)?;
        }
        None => {
            log::error!("no table encoding for key '{key}', skipping write");
            return Ok(());
        }
    }
    store.write_bytes(key, &buf)
}
