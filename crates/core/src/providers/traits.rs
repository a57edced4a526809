use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::coin::CoinData;
use crate::models::history::{Candlestick, PriceHistoryPoint, TimeRange};
use crate::models::stats::MarketStats;

/// Trait abstraction over where market data comes from.
///
/// The bundled implementation is the simulated [`MockMarketSource`];
/// a live feed would implement the same trait and leave the stores and
/// the feed orchestration untouched.
///
/// [`MockMarketSource`]: super::mock::MockMarketSource
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// A full market snapshot, ordered by rank.
    async fn fetch_market_data(&self) -> Result<Vec<CoinData>, CoreError>;

    /// One live tick applied to `current`. Must be cheap.
    async fn update_prices(&self, current: &[CoinData]) -> Result<Vec<CoinData>, CoreError>;

    /// Aggregate statistics over the whole market.
    async fn fetch_market_stats(&self) -> Result<MarketStats, CoreError>;

    /// Hourly history of one coin. Unknown ids yield an empty series.
    async fn fetch_price_history(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Vec<PriceHistoryPoint>, CoreError>;

    /// OHLCV bars of one coin. Unknown ids yield an empty series.
    async fn fetch_candlesticks(
        &self,
        coin_id: &str,
        range: TimeRange,
    ) -> Result<Vec<Candlestick>, CoreError>;

    /// Coins whose id, symbol or name contains `query` (case-insensitive).
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CoinData>, CoreError>;
}
