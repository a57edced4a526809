use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{clamp_refresh_interval, EngineConfig};
use crate::models::alert::{AlertKind, PriceAlert};
use crate::models::coin::CoinData;
use crate::models::portfolio::{Holding, HoldingSummary, Portfolio};
use crate::models::preferences::{SortDirection, SortField};
use crate::models::stats::MarketStats;
use crate::services::valuation::ValuationService;
use crate::storage::kv::KeyValueStore;
use crate::storage::manager::{StorageManager, MARKET_STORAGE_KEY};

use super::observer::{Listener, SubscriptionId, Subscribers};

/// Live-tick period before the user picks one (5 s).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;

/// Everything the market views read from.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    /// Latest snapshot, catalog order
    pub market_data: Vec<CoinData>,
    pub market_stats: Option<MarketStats>,
    pub favorites: BTreeSet<String>,
    pub portfolio: Portfolio,
    pub alerts: Vec<PriceAlert>,

    pub is_loading: bool,
    pub error: Option<String>,
    pub last_update: DateTime<Utc>,
    /// Live-tick period in milliseconds (1 000–30 000)
    pub refresh_interval: u64,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
}

impl MarketState {
    fn with_refresh_interval(refresh_interval: u64) -> Self {
        Self {
            market_data: Vec::new(),
            market_stats: None,
            favorites: BTreeSet::new(),
            portfolio: Portfolio::new(),
            alerts: Vec::new(),
            is_loading: false,
            error: None,
            last_update: Utc::now(),
            refresh_interval,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::with_refresh_interval(DEFAULT_REFRESH_INTERVAL_MS)
    }
}

/// The slice of [`MarketState`] that survives restarts.
///
/// Snapshot, stats, loading/error and last-update are never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedMarketState {
    pub favorites: BTreeSet<String>,
    pub portfolio: Portfolio,
    pub alerts: Vec<PriceAlert>,
    pub refresh_interval: u64,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
}

impl Default for PersistedMarketState {
    fn default() -> Self {
        Self {
            favorites: BTreeSet::new(),
            portfolio: Portfolio::new(),
            alerts: Vec::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl From<&MarketState> for PersistedMarketState {
    fn from(state: &MarketState) -> Self {
        Self {
            favorites: state.favorites.clone(),
            portfolio: state.portfolio.clone(),
            alerts: state.alerts.clone(),
            refresh_interval: state.refresh_interval,
            sort_by: state.sort_by,
            sort_direction: state.sort_direction,
        }
    }
}

/// Reactive container for market data and the user's market-related state.
///
/// Mutations are synchronous and never fail: unknown ids degrade to no-ops
/// and invalid amounts are ignored with a warning. After each mutation the
/// persisted slice is written (when storage is attached) and subscribers
/// are notified with the new state. Derived queries recompute on every
/// call.
pub struct MarketStore {
    state: MarketState,
    storage: Option<Arc<dyn KeyValueStore>>,
    subscribers: Subscribers<MarketState>,
    valuation: ValuationService,
    /// Bumped on every published snapshot
    snapshot_version: u64,
}

impl std::fmt::Debug for MarketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketStore")
            .field("coins", &self.state.market_data.len())
            .field("favorites", &self.state.favorites.len())
            .field("holdings", &self.state.portfolio.len())
            .field("alerts", &self.state.alerts.len())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl MarketStore {
    /// Store without persistence.
    pub fn new() -> Self {
        Self::build(None, DEFAULT_REFRESH_INTERVAL_MS)
    }

    /// Store rehydrated from `storage`; later mutations are written back.
    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(Some(storage), DEFAULT_REFRESH_INTERVAL_MS)
    }

    /// Store using `config`'s default refresh interval when nothing is cached.
    pub fn with_config(config: &EngineConfig, storage: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self::build(storage, config.default_refresh_interval_ms)
    }

    fn build(storage: Option<Arc<dyn KeyValueStore>>, default_refresh_interval: u64) -> Self {
        let mut state = MarketState::with_refresh_interval(clamp_refresh_interval(default_refresh_interval));

        if let Some(store) = &storage {
            if let Some(cached) =
                StorageManager::load::<PersistedMarketState>(store.as_ref(), MARKET_STORAGE_KEY)
            {
                debug!(
                    "Rehydrated market state: {} favorites, {} holdings, {} alerts",
                    cached.favorites.len(),
                    cached.portfolio.len(),
                    cached.alerts.len()
                );
                let mut portfolio = cached.portfolio;
                portfolio.retain(|coin_id, holding| {
                    let valid = is_positive(holding.amount) && is_positive(holding.purchase_price);
                    if !valid {
                        warn!(
                            "Dropping cached holding for '{coin_id}': amount {} and purchase price {} must be positive",
                            holding.amount, holding.purchase_price
                        );
                    }
                    valid
                });
                state.favorites = cached.favorites;
                state.portfolio = portfolio;
                state.alerts = cached.alerts;
                state.refresh_interval = clamp_refresh_interval(cached.refresh_interval);
                state.sort_by = cached.sort_by;
                state.sort_direction = cached.sort_direction;
            }
        }

        Self {
            state,
            storage,
            subscribers: Subscribers::new(),
            valuation: ValuationService::new(),
            snapshot_version: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &MarketState {
        &self.state
    }

    /// The persisted slice as it would be written now.
    #[must_use]
    pub fn persisted(&self) -> PersistedMarketState {
        PersistedMarketState::from(&self.state)
    }

    /// Generation of `market_data`; changes whenever a new snapshot is published.
    #[must_use]
    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    // ── Subscriptions ───────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Listener<MarketState>) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ── Snapshot setters ────────────────────────────────────────────

    pub fn set_market_data(&mut self, data: Vec<CoinData>) {
        self.state.market_data = data;
        self.snapshot_version = self.snapshot_version.wrapping_add(1);
        self.commit(false);
    }

    pub fn set_market_stats(&mut self, stats: MarketStats) {
        self.state.market_stats = Some(stats);
        self.commit(false);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.commit(false);
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
        self.commit(false);
    }

    pub fn set_last_update(&mut self, at: DateTime<Utc>) {
        self.state.last_update = at;
        self.commit(false);
    }

    // ── Favorites ───────────────────────────────────────────────────

    /// Idempotent: adding an existing favorite changes nothing.
    pub fn add_to_favorites(&mut self, coin_id: &str) {
        if self.state.favorites.insert(coin_id.to_string()) {
            self.commit(true);
        }
    }

    pub fn remove_from_favorites(&mut self, coin_id: &str) {
        if self.state.favorites.remove(coin_id) {
            self.commit(true);
        }
    }

    pub fn toggle_favorite(&mut self, coin_id: &str) {
        if self.is_favorite(coin_id) {
            self.remove_from_favorites(coin_id);
        } else {
            self.add_to_favorites(coin_id);
        }
    }

    #[must_use]
    pub fn is_favorite(&self, coin_id: &str) -> bool {
        self.state.favorites.contains(coin_id)
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Record (or replace) the holding for `coin_id`, stamped now.
    /// Replacing is not additive: the previous amount is discarded.
    pub fn add_to_portfolio(&mut self, coin_id: &str, amount: f64, purchase_price: f64) {
        if !is_positive(amount) || !is_positive(purchase_price) {
            warn!(
                "Ignoring holding for '{coin_id}': amount {amount} and purchase price {purchase_price} must be positive"
            );
            return;
        }
        self.state.portfolio.insert(
            coin_id.to_string(),
            Holding::new(amount, purchase_price, Utc::now()),
        );
        self.commit(true);
    }

    pub fn remove_from_portfolio(&mut self, coin_id: &str) {
        if self.state.portfolio.remove(coin_id).is_some() {
            self.commit(true);
        }
    }

    /// Replace the amount of an existing holding. No-op when `coin_id` is
    /// not held or `amount` is not positive.
    pub fn update_portfolio_amount(&mut self, coin_id: &str, amount: f64) {
        if !is_positive(amount) {
            warn!("Ignoring amount update for '{coin_id}': {amount} must be positive");
            return;
        }
        match self.state.portfolio.get_mut(coin_id) {
            Some(holding) => {
                holding.amount = amount;
                self.commit(true);
            }
            None => debug!("No holding for '{coin_id}' to update"),
        }
    }

    #[must_use]
    pub fn holding(&self, coin_id: &str) -> Option<&Holding> {
        self.state.portfolio.get(coin_id)
    }

    #[must_use]
    pub fn has_holding(&self, coin_id: &str) -> bool {
        self.state.portfolio.contains_key(coin_id)
    }

    // ── Alerts ──────────────────────────────────────────────────────

    /// Add an active alert and return its fresh id.
    pub fn add_alert(&mut self, coin_id: &str, price: f64, kind: AlertKind) -> Uuid {
        let alert = PriceAlert::new(coin_id, price, kind);
        let id = alert.id;
        self.state.alerts.push(alert);
        self.commit(true);
        id
    }

    pub fn remove_alert(&mut self, alert_id: Uuid) {
        let before = self.state.alerts.len();
        self.state.alerts.retain(|a| a.id != alert_id);
        if self.state.alerts.len() != before {
            self.commit(true);
        }
    }

    pub fn toggle_alert(&mut self, alert_id: Uuid) {
        if let Some(alert) = self.state.alerts.iter_mut().find(|a| a.id == alert_id) {
            alert.active = !alert.active;
            self.commit(true);
        }
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub fn set_sort_by(&mut self, sort_by: SortField) {
        self.state.sort_by = sort_by;
        self.commit(true);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.state.sort_direction = direction;
        self.commit(true);
    }

    /// Set the live-tick period, clamped to 1–30 s.
    pub fn set_refresh_interval(&mut self, interval_ms: u64) {
        self.state.refresh_interval = clamp_refresh_interval(interval_ms);
        self.commit(true);
    }

    // ── Derived queries ─────────────────────────────────────────────

    /// Copy of the snapshot, stably sorted by the selected field and direction.
    #[must_use]
    pub fn sorted_market_data(&self) -> Vec<CoinData> {
        let key = |coin: &CoinData| match self.state.sort_by {
            SortField::MarketCap => coin.market_cap,
            SortField::Price => coin.current_price,
            SortField::Change24h => coin.price_change_percentage_24h,
        };
        let mut sorted = self.state.market_data.clone();
        sorted.sort_by(|a, b| {
            let ordering = key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal);
            match self.state.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        sorted
    }

    /// Snapshot entries that are favorites, in snapshot order.
    #[must_use]
    pub fn favorite_coins(&self) -> Vec<CoinData> {
        self.state
            .market_data
            .iter()
            .filter(|c| self.state.favorites.contains(&c.id))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn coin_by_id(&self, coin_id: &str) -> Option<&CoinData> {
        self.state.market_data.iter().find(|c| c.id == coin_id)
    }

    /// Σ live price × amount; holdings missing from the snapshot count as 0.
    #[must_use]
    pub fn portfolio_value(&self) -> f64 {
        self.valuation
            .portfolio_value(&self.state.portfolio, &self.state.market_data)
    }

    /// `(value − invested) / invested × 100`, or 0 when nothing is invested.
    #[must_use]
    pub fn portfolio_change(&self) -> f64 {
        self.valuation
            .portfolio_change(&self.state.portfolio, &self.state.market_data)
    }

    #[must_use]
    pub fn holding_summaries(&self) -> Vec<HoldingSummary> {
        self.valuation
            .summarize(&self.state.portfolio, &self.state.market_data)
    }

    /// Active alerts currently crossed by the live price.
    #[must_use]
    pub fn triggered_alerts(&self) -> Vec<&PriceAlert> {
        self.valuation
            .triggered_alerts(&self.state.alerts, &self.state.market_data)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn commit(&mut self, persist: bool) {
        if persist {
            self.persist();
        }
        self.subscribers.notify(&self.state);
    }

    fn persist(&self) {
        let Some(store) = &self.storage else {
            return;
        };
        let snapshot = PersistedMarketState::from(&self.state);
        if let Err(e) = StorageManager::save(store.as_ref(), MARKET_STORAGE_KEY, &snapshot) {
            warn!("Failed to persist market state: {e}");
        }
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
