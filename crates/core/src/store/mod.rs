pub mod market_store;
pub mod observer;
pub mod settings_store;

use std::sync::{Arc, Mutex, MutexGuard};

use market_store::MarketStore;
use settings_store::SettingsStore;

/// Market store shared between the feed, the pollers and the UI.
pub type SharedMarketStore = Arc<Mutex<MarketStore>>;

/// Settings store shared between the feed and the UI.
pub type SharedSettingsStore = Arc<Mutex<SettingsStore>>;

/// Lock a shared store. A poisoned lock still yields the state: store
/// mutations leave it consistent even if a listener panicked.
pub fn lock_store<T>(store: &Mutex<T>) -> MutexGuard<'_, T> {
    store
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
