//! Key-value persistence for the monitor's two records: the target list and
//! the notification config. Each record is read whole at startup and written
//! whole after every mutation.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const RECORD_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record '{key}' has unsupported version {found} (expected {expected})")]
    UnsupportedVersion { key: String, found: u32, expected: u32 },
}

/// A durable string-keyed store. Implementations must make `put` all-or-nothing.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Serialize, Deserialize)]
struct VersionedRecord<T> {
    version: u32,
    data: T,
}

/// Reads a versioned record. Returns `Ok(None)` when the key has never been written.
pub fn load_record<T: DeserializeOwned>(
    kv: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    let record: VersionedRecord<T> = serde_json::from_str(&raw)?;
    if record.version != RECORD_VERSION {
        return Err(StorageError::UnsupportedVersion {
            key: key.to_string(),
            found: record.version,
            expected: RECORD_VERSION,
        });
    }
    Ok(Some(record.data))
}

pub fn save_record<T: Serialize>(kv: &dyn KvStore, key: &str, data: &T) -> Result<(), StorageError> {
    let record = VersionedRecord {
        version: RECORD_VERSION,
        data,
    };
    let raw = serde_json::to_string_pretty(&record)?;
    kv.put(key, &raw)
}

/// Stores each key as `<data_dir>/<key>.json`.
pub struct FileKvStore {
    data_dir: PathBuf,
}

impl FileKvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.record_path(key))
            .map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
