use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::kv::KeyValueStore;

/// Namespace key of the persisted market-store slice.
pub const MARKET_STORAGE_KEY: &str = "market-storage";

/// Namespace key of the persisted settings.
pub const SETTINGS_STORAGE_KEY: &str = "settings-storage";

/// Version written into every envelope.
pub const STATE_VERSION: u32 = 0;

/// On-disk wrapper: `{"state": {...}, "version": 0}`.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// High-level persistence: JSON documents in a [`KeyValueStore`] namespace.
pub struct StorageManager;

impl StorageManager {
    /// Serialize `state` into its envelope and write it under `key`.
    ///
    /// Flow: state → Envelope → JSON → key-value store
    pub fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, state: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(&Envelope {
            state,
            version: STATE_VERSION,
        })
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize '{key}': {e}")))?;
        store.set(key, &json)
    }

    /// Read and decode the document under `key`.
    ///
    /// A missing key, an unreadable store, a malformed document or a
    /// version mismatch all come back as `None`: the caller proceeds as if
    /// nothing was cached.
    pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No cached state under '{key}'");
                return None;
            }
            Err(e) => {
                warn!("Could not read cached state '{key}': {e}");
                return None;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.version == STATE_VERSION => Some(envelope.state),
            Ok(envelope) => {
                warn!(
                    "Ignoring cached state '{key}' with version {} (expected {STATE_VERSION})",
                    envelope.version
                );
                None
            }
            Err(e) => {
                warn!("Ignoring malformed cached state '{key}': {e}");
                None
            }
        }
    }

    /// Drop the document under `key`.
    pub fn clear(store: &dyn KeyValueStore, key: &str) -> Result<(), CoreError> {
        store.remove(key)
    }
}
