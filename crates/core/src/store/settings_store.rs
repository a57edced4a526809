use log::{debug, warn};
use std::sync::Arc;

use crate::models::settings::{
    format_price, DisplaySettings, NotificationKind, NotificationSettings, Settings,
};
use crate::storage::kv::KeyValueStore;
use crate::storage::manager::{StorageManager, SETTINGS_STORAGE_KEY};

use super::observer::{Listener, SubscriptionId, Subscribers};

/// Reactive container for display and notification preferences.
///
/// The whole settings document is persisted on every change.
pub struct SettingsStore {
    settings: Settings,
    storage: Option<Arc<dyn KeyValueStore>>,
    subscribers: Subscribers<Settings>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            storage: None,
            subscribers: Subscribers::new(),
        }
    }

    /// Settings rehydrated from `storage`; defaults on a cache miss.
    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Self {
        let settings = StorageManager::load::<Settings>(storage.as_ref(), SETTINGS_STORAGE_KEY)
            .unwrap_or_default();
        debug!("Settings loaded: currency {}", settings.display.currency);
        Self {
            settings,
            storage: Some(storage),
            subscribers: Subscribers::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn display(&self) -> &DisplaySettings {
        &self.settings.display
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationSettings {
        &self.settings.notifications
    }

    pub fn subscribe(&mut self, listener: Listener<Settings>) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Change display preferences in place, e.g.
    /// `store.update_display(|d| d.currency = Currency::Eur)`.
    pub fn update_display(&mut self, f: impl FnOnce(&mut DisplaySettings)) {
        f(&mut self.settings.display);
        self.commit();
    }

    pub fn update_notifications(&mut self, f: impl FnOnce(&mut NotificationSettings)) {
        f(&mut self.settings.notifications);
        self.commit();
    }

    pub fn reset_to_defaults(&mut self) {
        self.settings = Settings::default();
        self.commit();
    }

    #[must_use]
    pub fn currency_symbol(&self) -> &'static str {
        self.settings.display.currency.symbol()
    }

    /// `amount` with the selected currency's symbol and a K/M/B suffix.
    #[must_use]
    pub fn format_price(&self, amount: f64) -> String {
        format_price(amount, self.settings.display.currency)
    }

    #[must_use]
    pub fn is_notification_enabled(&self, kind: NotificationKind) -> bool {
        self.settings.notifications.is_enabled(kind)
    }

    fn commit(&mut self) {
        if let Some(store) = &self.storage {
            if let Err(e) = StorageManager::save(store.as_ref(), SETTINGS_STORAGE_KEY, &self.settings) {
                warn!("Failed to persist settings: {e}");
            }
        }
        self.subscribers.notify(&self.settings);
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
