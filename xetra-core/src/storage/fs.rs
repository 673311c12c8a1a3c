//! Directory-backed bucket: object keys are relative file paths.
//!
//! Writes are atomic (write to `.tmp`, rename into place) so a crashed run
//! never leaves a half-written report or ledger behind.

use super::{ObjectStore, StorageError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A bucket rooted at a local directory.
pub struct FsBucket {
    root: PathBuf,
}

impl FsBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn collect_keys(&self, dir: &Path, out: &mut Vec<String>) -> Result<(), StorageError> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_keys(&path, out)?;
            } else if let Ok(rel) = path.strip_prefix(&self.root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsBucket {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        self.collect_keys(&self.root, &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn read_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.key_path(key)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound { key: key.into() }
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StorageError::Write {
                key: key.into(),
                message: format!("atomic rename failed: {e}"),
            }
        })
    }
}
