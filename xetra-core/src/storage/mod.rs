//! Object-storage capability interface.
//!
//! The pipeline never talks to a concrete bucket directly — everything goes
//! through [`ObjectStore`], so the filesystem-backed bucket and the in-memory
//! test double are interchangeable. Keys are `/`-separated paths relative to
//! the bucket root; table encoding is chosen by the key's extension in the
//! codec layer ([`table`]).

pub mod fs;
pub mod memory;
pub mod table;

pub use fs::FsBucket;
pub use memory::MemoryBucket;
pub use table::{read_table, write_table, TableFormat};

use thiserror::Error;

/// Structured errors for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("decode error for '{key}': {message}")]
    Decode { key: String, message: String },

    #[error("write error for '{key}': {message}")]
    Write { key: String, message: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability interface over a bucket of byte objects.
pub trait ObjectStore: Send + Sync {
    /// All keys starting with `prefix`, in ascending key order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Raw bytes of one object.
    fn read_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `bytes` under `key`, replacing any existing object.
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}
