//! Persistent key/value backends for the geocode cache.
//!
//! A [`CacheBackend`] is a flat string namespace. Which implementation is
//! used is decided once, when the [`CacheStore`](super::CacheStore) is built.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{GeoError, Result};

/// A flat string key/value store.
pub trait CacheBackend: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys currently stored.
    fn keys(&self) -> Result<Vec<String>>;

    /// Whether a persistent store exists at all in this context.
    fn is_available(&self) -> bool {
        true
    }
}

/// Backend storing one JSON file per key under a cache directory.
///
/// File names are a hash of the key, so writers of different keys never
/// touch the same file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    max_bytes: Option<u64>,
}

/// On-disk form of a single key/value pair.
#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    key: String,
    value: String,
}

impl StoredValue {
    fn size(&self) -> u64 {
        (self.key.len() + self.value.len()) as u64
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FileBackend {
    /// Create a backend storing entries in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes: None,
        }
    }

    /// Limit the total stored size (keys plus values) in bytes.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Directory holding the entry files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let hash = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(&hash[..16])))
    }

    fn read_entry(&self, path: &Path) -> Result<Option<StoredValue>> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&json) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!("Ignoring unreadable cache file {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn entries(&self) -> Result<Vec<StoredValue>> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for item in dir {
            let path = item?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                out.extend(self.read_entry(&path)?);
            }
        }
        Ok(out)
    }

    /// Reject writes that grow the store past `max_bytes`.
    fn check_quota(&self, key: &str, old_size: u64, new_size: u64) -> Result<()> {
        let Some(limit) = self.max_bytes else {
            return Ok(());
        };
        if new_size <= old_size {
            return Ok(());
        }

        let others: u64 = self
            .entries()?
            .iter()
            .filter(|e| e.key != key)
            .map(StoredValue::size)
            .sum();
        let needed = others + new_size;
        if needed > limit {
            return Err(GeoError::QuotaExceeded { needed, limit });
        }
        Ok(())
    }
}

impl CacheBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_entry(&self.entry_path(key))?
            .filter(|stored| stored.key == key)
            .map(|stored| stored.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        let stored = StoredValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let old_size = self.read_entry(&path)?.map_or(0, |old| old.size());
        self.check_quota(key, old_size, stored.size())?;

        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, serde_json::to_string(&stored)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        if self.read_entry(&path)?.is_none() {
            return Ok(false);
        }
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|e| e.key).collect())
    }
}

/// In-process backend. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Backend for contexts with no persistent store: always misses, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl CacheBackend for NullBackend {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn is_available(&self) -> bool {
        false
    }
}
