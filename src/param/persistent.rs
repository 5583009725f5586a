//! Persistent Tier Module
//!
//! String-keyed durable store abstraction plus the prefixed tier wrapper the
//! parameter cache reads through. Every store failure is absorbed here.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::param::entry::{current_timestamp_ms, CacheEntry};
use crate::param::memory::TierLookup;

// == Persistent Store Trait ==
/// Synchronous key-value store in the shape of browser local storage.
///
/// Any call may fail; callers treat failures as recoverable.
pub trait PersistentStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Every key currently stored, including keys owned by other users of the store.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

// == Memory Store ==
/// In-process store with an optional byte quota over keys and values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl PersistentStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
                + key.len()
                + value.len();
            if used > quota {
                return Err(StoreError::QuotaExceeded { used, quota });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }
}

// == File Store ==
/// Store persisted as a single JSON object file, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened file store {} with {} keys", path.display(), items.len());
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the whole map to a sibling temp file, then renames it over the
    /// store file so a crash never leaves a truncated store behind.
    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(items)?;
        let tmp = self.temp_path();

        if let Err(err) = fs::write(&tmp, raw).and_then(|_| fs::rename(&tmp, &self.path)) {
            if tmp.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    debug!("Could not remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl PersistentStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(err) = self.flush(&items) {
            // Keep the in-memory view consistent with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(err) = self.flush(&items) {
            // The entry is still on disk
            items.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }
}

// == Persistent Tier ==
/// Prefixed view over a [`PersistentStore`] holding serialized [`CacheEntry`] values.
///
/// Failures are logged at `warn` and reported as a miss or a no-op.
#[derive(Clone)]
pub struct PersistentTier {
    store: Arc<dyn PersistentStore>,
    prefix: String,
}

impl PersistentTier {
    pub fn new(store: Arc<dyn PersistentStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn storage_key(&self, code: &str) -> String {
        format!("{}{}", self.prefix, code)
    }

    // == Get ==
    /// Reads a code, deleting the stored entry if it is expired or unreadable.
    pub fn get(&self, code: &str) -> TierLookup {
        let key = self.storage_key(code);
        let raw = match self.store.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TierLookup::Miss,
            Err(err) => {
                warn!("Persistent read of '{}' failed: {}", key, err);
                return TierLookup::Miss;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Discarding unreadable persistent entry '{}': {}", key, err);
                self.remove_key(&key);
                return TierLookup::Miss;
            }
        };

        if entry.is_expired() {
            self.remove_key(&key);
            TierLookup::Expired
        } else {
            TierLookup::Hit(entry.value)
        }
    }

    // == Set ==
    /// Writes an entry. Returns `false` when the store rejected it.
    pub fn set(&self, code: &str, entry: &CacheEntry) -> bool {
        let key = self.storage_key(code);
        let result = serde_json::to_string(entry)
            .map_err(StoreError::from)
            .and_then(|raw| self.store.set_item(&key, &raw));

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!("Persistent write of '{}' failed: {}", key, err);
                false
            }
        }
    }

    // == Remove ==
    pub fn remove(&self, code: &str) {
        let key = self.storage_key(code);
        self.remove_key(&key);
    }

    fn remove_key(&self, key: &str) {
        if let Err(err) = self.store.remove_item(key) {
            warn!("Persistent delete of '{}' failed: {}", key, err);
        }
    }

    fn owned_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.prefix))
                .collect(),
            Err(err) => {
                warn!("Persistent key enumeration failed: {}", err);
                Vec::new()
            }
        }
    }

    // == Clear ==
    /// Removes every key carrying this tier's prefix. Other keys are left alone.
    pub fn clear(&self) -> usize {
        let keys = self.owned_keys();
        for key in &keys {
            self.remove_key(key);
        }
        keys.len()
    }

    // == Purge Expired ==
    /// Removes expired or unreadable entries under this prefix.
    pub fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut removed = 0;

        for key in self.owned_keys() {
            let stale = match self.store.get_item(&key) {
                Ok(Some(raw)) => serde_json::from_str::<CacheEntry>(&raw)
                    .map(|entry| entry.is_expired_at(now))
                    .unwrap_or(true),
                Ok(None) => false,
                Err(err) => {
                    warn!("Persistent read of '{}' failed: {}", key, err);
                    false
                }
            };

            if stale {
                self.remove_key(&key);
                removed += 1;
            }
        }

        removed
    }

    /// Number of stored keys carrying this tier's prefix.
    pub fn count(&self) -> usize {
        self.owned_keys().len()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
