use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::coin::CoinData;
use crate::models::history::{Candlestick, PriceHistoryPoint, TimeRange};
use crate::providers::traits::MarketDataSource;
use crate::services::scheduler::{PollingHandle, RequestSequence};
use crate::store::{lock_store, SharedMarketStore, SharedSettingsStore};

/// Message shown when a snapshot load fails.
pub const MARKET_DATA_ERROR: &str = "Failed to load market data";

/// Message shown when a stats load fails.
pub const MARKET_STATS_ERROR: &str = "Failed to load market stats";

/// Moves data from a [`MarketDataSource`] into the market store.
///
/// Owns the loading/error protocol and the stale-response guards. Store
/// locks are never held across an `.await`, so a live tick always starts
/// from the most recently committed snapshot.
pub struct MarketFeed {
    source: Arc<dyn MarketDataSource>,
    store: SharedMarketStore,
    settings: SharedSettingsStore,
    snapshot_requests: RequestSequence,
    stats_requests: RequestSequence,
    history_requests: RequestSequence,
    candle_requests: RequestSequence,
    search_limit: usize,
}

impl MarketFeed {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: SharedMarketStore,
        settings: SharedSettingsStore,
        search_limit: usize,
    ) -> Self {
        Self {
            source,
            store,
            settings,
            snapshot_requests: RequestSequence::new(),
            stats_requests: RequestSequence::new(),
            history_requests: RequestSequence::new(),
            candle_requests: RequestSequence::new(),
            search_limit,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch a full snapshot and publish it.
    ///
    /// Sets `is_loading` and clears `error` first. On failure the store gets
    /// [`MARKET_DATA_ERROR`] and keeps its previous snapshot. A response
    /// overtaken by a newer completed load is discarded. Returns whether a
    /// snapshot was published.
    pub async fn load_market_data(&self) -> bool {
        let token = self.snapshot_requests.begin();
        {
            let mut store = lock_store(&self.store);
            store.set_loading(true);
            store.set_error(None);
        }

        let result = self.source.fetch_market_data().await;
        if !self.snapshot_requests.complete(token) {
            debug!("Discarding stale snapshot response #{token}");
            return false;
        }

        let mut store = lock_store(&self.store);
        let published = match result {
            Ok(coins) => {
                info!("Loaded {} coins from {}", coins.len(), self.source.name());
                store.set_market_data(coins);
                store.set_last_update(Utc::now());
                true
            }
            Err(e) => {
                error!("Snapshot load from {} failed: {e}", self.source.name());
                store.set_error(Some(MARKET_DATA_ERROR.to_string()));
                false
            }
        };
        store.set_loading(false);
        published
    }

    /// One live tick over the current snapshot.
    ///
    /// Skipped while loading, when there is no snapshot yet, or when
    /// animations are disabled in settings. Failures are logged and leave
    /// the store untouched, and so does an update whose input snapshot was
    /// replaced while it was in flight. Returns whether the snapshot changed.
    pub async fn tick(&self) -> bool {
        let (current, version) = {
            let store = lock_store(&self.store);
            if store.state().is_loading {
                return false;
            }
            (store.state().market_data.clone(), store.snapshot_version())
        };
        let animations_enabled = lock_store(&self.settings).display().animations_enabled;
        if current.is_empty() || !animations_enabled {
            return false;
        }

        match self.source.update_prices(&current).await {
            Ok(updated) => {
                let mut store = lock_store(&self.store);
                if store.snapshot_version() != version {
                    debug!("Discarding price tick built from an outdated snapshot");
                    return false;
                }
                store.set_market_data(updated);
                store.set_last_update(Utc::now());
                true
            }
            Err(e) => {
                warn!("Failed to update prices: {e}");
                false
            }
        }
    }

    /// Fetch aggregate stats and publish them.
    /// On failure the store gets [`MARKET_STATS_ERROR`].
    pub async fn refresh_stats(&self) -> bool {
        let token = self.stats_requests.begin();
        lock_store(&self.store).set_loading(true);

        let result = self.source.fetch_market_stats().await;
        if !self.stats_requests.complete(token) {
            debug!("Discarding stale stats response #{token}");
            return false;
        }

        let mut store = lock_store(&self.store);
        let published = match result {
            Ok(stats) => {
                store.set_market_stats(stats);
                true
            }
            Err(e) => {
                error!("Stats load from {} failed: {e}", self.source.name());
                store.set_error(Some(MARKET_STATS_ERROR.to_string()));
                false
            }
        };
        store.set_loading(false);
        published
    }

    /// History of one coin. `Ok(None)` when a newer history request has
    /// already completed.
    pub async fn price_history(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Option<Vec<PriceHistoryPoint>>, CoreError> {
        let token = self.history_requests.begin();
        let result = self.source.fetch_price_history(coin_id, range).await;
        if !self.history_requests.complete(token) {
            debug!("Discarding stale history response #{token} for '{coin_id}'");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Candlesticks of one coin. `Ok(None)` when stale.
    pub async fn candlesticks(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Option<Vec<Candlestick>>, CoreError> {
        let token = self.candle_requests.begin();
        let result = self.source.fetch_candlesticks(coin_id, range).await;
        if !self.candle_requests.complete(token) {
            debug!("Discarding stale candlestick response #{token} for '{coin_id}'");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Search the market. A blank query returns the current snapshot.
    pub async fn search(&self, query: &str) -> Result<Vec<CoinData>, CoreError> {
        if query.trim().is_empty() {
            return Ok(lock_store(&self.store).state().market_data.clone());
        }
        self.source.search(query, self.search_limit).await
    }

    /// Spawn the live-tick poller at the store's current refresh interval.
    pub fn start_price_polling(self: &Arc<Self>) -> PollingHandle {
        let period = Duration::from_millis(lock_store(&self.store).state().refresh_interval);
        let feed = Arc::clone(self);
        PollingHandle::spawn("price-ticker", period, move || {
            let feed = Arc::clone(&feed);
            async move {
                feed.tick().await;
            }
        })
    }

    /// Spawn the stats poller.
    pub fn start_stats_polling(self: &Arc<Self>, period: Duration) -> PollingHandle {
        let feed = Arc::clone(self);
        PollingHandle::spawn("stats-refresher", period, move || {
            let feed = Arc::clone(&feed);
            async move {
                feed.refresh_stats().await;
            }
        })
    }
}
