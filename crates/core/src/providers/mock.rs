use async_trait::async_trait;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::errors::CoreError;
use crate::models::coin::CoinData;
use crate::models::history::{Candlestick, PriceHistoryPoint, TimeRange};
use crate::models::stats::MarketStats;
use crate::services::generator::MarketDataGenerator;

use super::traits::MarketDataSource;

/// Simulated market source backed by a [`MarketDataGenerator`].
///
/// Snapshot, stats and history fetches resolve after a fixed artificial
/// delay so loading states can be exercised; live ticks resolve at once.
/// The delay is not a retry or backoff: these calls cannot fail by
/// network conditions.
pub struct MockMarketSource<R: Rng + Send = StdRng> {
    generator: Mutex<MarketDataGenerator<R>>,
    snapshot_delay: Duration,
    stats_delay: Duration,
    history_delay: Duration,
}

impl MockMarketSource<StdRng> {
    /// Source over an entropy-seeded generator.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        Ok(Self::from_generator(MarketDataGenerator::new(config)?))
    }

    /// Source over a deterministic generator.
    pub fn seeded(config: EngineConfig, seed: u64) -> Result<Self, CoreError> {
        Ok(Self::from_generator(MarketDataGenerator::seeded(config, seed)?))
    }
}

impl<R: Rng + Send> MockMarketSource<R> {
    /// Wrap an existing generator; delays come from its config.
    pub fn from_generator(generator: MarketDataGenerator<R>) -> Self {
        let config = generator.config();
        let snapshot_delay = config.snapshot_delay();
        let stats_delay = config.stats_delay();
        let history_delay = config.history_delay();
        Self {
            generator: Mutex::new(generator),
            snapshot_delay,
            stats_delay,
            history_delay,
        }
    }

    /// Run `f` with exclusive access to the generator.
    pub fn with_generator<T>(
        &self,
        f: impl FnOnce(&mut MarketDataGenerator<R>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut generator = self.generator.lock().map_err(|_| CoreError::Source {
            source_name: self.name().to_string(),
            message: "generator lock poisoned".into(),
        })?;
        f(&mut generator)
    }

    async fn simulate_latency(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<R: Rng + Send> MarketDataSource for MockMarketSource<R> {
    fn name(&self) -> &str {
        "MockMarket"
    }

    async fn fetch_market_data(&self) -> Result<Vec<CoinData>, CoreError> {
        Self::simulate_latency(self.snapshot_delay).await;
        self.with_generator(|g| g.generate_snapshot())
    }

    async fn update_prices(&self, current: &[CoinData]) -> Result<Vec<CoinData>, CoreError> {
        self.with_generator(|g| g.apply_incremental_update(current))
    }

    async fn fetch_market_stats(&self) -> Result<MarketStats, CoreError> {
        Self::simulate_latency(self.stats_delay).await;
        self.with_generator(|g| g.compute_stats())
    }

    async fn fetch_price_history(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Vec<PriceHistoryPoint>, CoreError> {
        Self::simulate_latency(self.history_delay).await;
        let points = self.with_generator(|g| Ok(g.history(coin_id, range)))?;
        debug!("History for '{coin_id}' over {range}: {} points", points.len());
        Ok(points)
    }

    async fn fetch_candlesticks(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Vec<Candlestick>, CoreError> {
        Self::simulate_latency(self.history_delay).await;
        self.with_generator(|g| Ok(g.candlesticks(coin_id, range)))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CoinData>, CoreError> {
        self.with_generator(|g| g.search(query, limit))
    }
}
