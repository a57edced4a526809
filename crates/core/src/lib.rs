pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod store;

use std::sync::{Arc, Mutex};

use config::EngineConfig;
use errors::CoreError;
use models::{
    coin::CoinData,
    history::{Candlestick, PriceHistoryPoint, TimeRange},
    stats::MarketStats,
};
use providers::{mock::MockMarketSource, traits::MarketDataSource};
use services::{feed::MarketFeed, scheduler::PollingHandle};
use storage::kv::KeyValueStore;
use store::{
    lock_store, market_store::MarketStore, settings_store::SettingsStore, SharedMarketStore,
    SharedSettingsStore,
};

/// Main entry point for the coinpulse core library.
/// Composition root: owns the stores, the data source, the feed and its pollers.
///
/// Pollers are explicit handles: [`Dashboard::stop`] (or dropping the
/// dashboard) cancels them, and changing the refresh interval replaces
/// the live-tick poller instead of stacking a second one.
#[must_use]
pub struct Dashboard {
    config: EngineConfig,
    store: SharedMarketStore,
    settings: SharedSettingsStore,
    feed: Arc<MarketFeed>,
    price_poller: Option<PollingHandle>,
    stats_poller: Option<PollingHandle>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("source", &self.feed.source_name())
            .field("store", &*lock_store(&self.store))
            .field("price_poller", &self.price_poller)
            .field("stats_poller", &self.stats_poller)
            .finish()
    }
}

impl Dashboard {
    /// Dashboard over the simulated market, without persistence.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        let source = MockMarketSource::new(config.clone())?;
        Ok(Self::with_source(config, Arc::new(source), None))
    }

    /// Dashboard over the simulated market, rehydrating user state from `storage`.
    pub fn with_storage(
        config: EngineConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        let source = MockMarketSource::new(config.clone())?;
        Ok(Self::with_source(config, Arc::new(source), Some(storage)))
    }

    /// Dashboard over any data source.
    pub fn with_source(
        config: EngineConfig,
        source: Arc<dyn MarketDataSource>,
        storage: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let market_store = MarketStore::with_config(&config, storage.clone());
        let settings_store = match storage {
            Some(storage) => SettingsStore::with_storage(storage),
            None => SettingsStore::new(),
        };
        let store = Arc::new(Mutex::new(market_store));
        let settings = Arc::new(Mutex::new(settings_store));
        let feed = Arc::new(MarketFeed::new(
            source,
            Arc::clone(&store),
            Arc::clone(&settings),
            config.search_limit,
        ));

        Self {
            config,
            store,
            settings,
            feed,
            price_poller: None,
            stats_poller: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the market store (mutations, subscriptions, derived queries).
    pub fn store(&self) -> SharedMarketStore {
        Arc::clone(&self.store)
    }

    /// Shared handle to the settings store.
    pub fn settings(&self) -> SharedSettingsStore {
        Arc::clone(&self.settings)
    }

    pub fn feed(&self) -> &Arc<MarketFeed> {
        &self.feed
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Load the first snapshot and stats, then start both pollers.
    /// Returns whether the snapshot loaded. Must run inside a tokio runtime.
    pub async fn start(&mut self) -> bool {
        let loaded = self.feed.load_market_data().await;
        let needs_stats = lock_store(&self.store).state().market_stats.is_none();
        if needs_stats {
            self.feed.refresh_stats().await;
        }
        self.start_polling();
        loaded
    }

    /// (Re)start both pollers, cancelling any running ones first.
    pub fn start_polling(&mut self) {
        self.stop();
        self.price_poller = Some(self.feed.start_price_polling());
        self.stats_poller = Some(self.feed.start_stats_polling(self.config.stats_interval()));
    }

    /// Cancel both pollers. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut poller) = self.price_poller.take() {
            poller.cancel();
        }
        if let Some(mut poller) = self.stats_poller.take() {
            poller.cancel();
        }
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.price_poller.as_ref().is_some_and(PollingHandle::is_active)
    }

    pub fn price_poller(&self) -> Option<&PollingHandle> {
        self.price_poller.as_ref()
    }

    pub fn stats_poller(&self) -> Option<&PollingHandle> {
        self.stats_poller.as_ref()
    }

    /// Change the live-tick period (clamped to 1–30 s). A running price
    /// poller is replaced by one at the new period.
    pub fn set_refresh_interval(&mut self, interval_ms: u64) {
        lock_store(&self.store).set_refresh_interval(interval_ms);
        if let Some(mut old) = self.price_poller.take() {
            old.cancel();
            self.price_poller = Some(self.feed.start_price_polling());
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Current snapshot, sorted by the user's sort preference.
    #[must_use]
    pub fn market_data(&self) -> Vec<CoinData> {
        lock_store(&self.store).sorted_market_data()
    }

    /// Latest aggregate stats, or `None` before the first stats load.
    #[must_use]
    pub fn market_stats(&self) -> Option<MarketStats> {
        lock_store(&self.store).state().market_stats.clone()
    }

    #[must_use]
    pub fn coin(&self, coin_id: &str) -> Option<CoinData> {
        lock_store(&self.store).coin_by_id(coin_id).cloned()
    }

    /// Favorite coins in snapshot order.
    #[must_use]
    pub fn favorite_coins(&self) -> Vec<CoinData> {
        lock_store(&self.store).favorite_coins()
    }

    /// Portfolio value formatted with the selected display currency.
    #[must_use]
    pub fn formatted_portfolio_value(&self) -> String {
        let value = lock_store(&self.store).portfolio_value();
        lock_store(&self.settings).format_price(value)
    }

    pub async fn price_history(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Option<Vec<PriceHistoryPoint>>, CoreError> {
        self.feed.price_history(coin_id, range).await
    }

    pub async fn candlesticks(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Option<Vec<Candlestick>>, CoreError> {
        self.feed.candlesticks(coin_id, range).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<CoinData>, CoreError> {
        self.feed.search(query).await
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}
