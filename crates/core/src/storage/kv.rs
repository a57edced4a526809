use log::warn;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::CoreError;

use super::format;

/// Durable local key-value cache (the browser's local storage, natively a file).
///
/// Values are opaque strings; the stores put JSON documents in them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

fn lock_map(
    map: &Mutex<BTreeMap<String, String>>,
) -> Result<MutexGuard<'_, BTreeMap<String, String>>, CoreError> {
    map.lock()
        .map_err(|_| CoreError::Storage("key-value map lock poisoned".into()))
}

/// In-memory store. Clones share the same map, so a "restarted" store built
/// from a clone sees everything the previous one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(lock_map(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        lock_map(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        lock_map(&self.entries)?.remove(key);
        Ok(())
    }
}

/// Single-file store (native only). The whole map is rewritten on every
/// mutation; an unreadable file is treated as empty.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Open `path`, loading existing entries if the file is readable.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => Self::decode(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable store file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read store file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Encode a map into CPKV bytes.
    pub fn encode(entries: &BTreeMap<String, String>) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(entries)?;
        Ok(format::write_file(format::CURRENT_VERSION, &payload))
    }

    /// Decode CPKV bytes into a map.
    pub fn decode(bytes: &[u8]) -> Result<BTreeMap<String, String>, CoreError> {
        let (_, payload) = format::read_file(bytes)?;
        bincode::deserialize(payload)
            .map_err(|e| CoreError::Deserialization(format!("Failed to decode store payload: {e}")))
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        let bytes = Self::encode(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(lock_map(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = lock_map(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = lock_map(&self.entries)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
