use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, VecDeque};

use crate::config::EngineConfig;
use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::coin::CoinData;
use crate::models::history::{Candlestick, PriceHistoryPoint, TimeRange};
use crate::models::portfolio::{Holding, HoldingSummary};
use crate::models::stats::MarketStats;
use crate::services::catalog::AssetCatalog;
use crate::services::random_walk::{round_dollars, round_price, round_to, RandomWalk};
use crate::services::valuation;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// History points per candlestick.
const CANDLE_BUCKET: usize = 4;

/// Holdings used by [`MarketDataGenerator::sample_portfolio`]: (id, amount, purchase price).
const SAMPLE_HOLDINGS: &[(&str, f64, f64)] = &[
    ("bitcoin", 0.5, 40_000.0),
    ("ethereum", 2.0, 2_200.0),
    ("binancecoin", 5.0, 280.0),
    ("solana", 10.0, 85.0),
    ("cardano", 1_000.0, 0.45),
];

/// Synthetic market-data engine.
///
/// Owns the asset universe, the last-known price per asset and a capped
/// hourly history buffer per asset. Every operation is synchronous and
/// bounded by `universe × history_capacity`.
///
/// Prices start from each asset's base price and evolve by random-walk
/// steps; history is backfilled eagerly at construction so charts have
/// data immediately.
#[derive(Debug)]
pub struct MarketDataGenerator<R: Rng = StdRng> {
    config: EngineConfig,
    walk: RandomWalk<R>,
    catalog: AssetCatalog,
    last_prices: HashMap<String, f64>,
    history: HashMap<String, VecDeque<PriceHistoryPoint>>,
}

impl MarketDataGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        Self::with_walk(config, RandomWalk::from_entropy()?)
    }

    /// Deterministic generator (same seed → same universe and walk).
    pub fn seeded(config: EngineConfig, seed: u64) -> Result<Self, CoreError> {
        Self::with_walk(config, RandomWalk::seeded(seed))
    }
}

impl<R: Rng> MarketDataGenerator<R> {
    /// Build the universe from the fixed table plus fillers, then backfill history.
    pub fn with_walk(config: EngineConfig, mut walk: RandomWalk<R>) -> Result<Self, CoreError> {
        config.validate()?;
        let catalog = AssetCatalog::build_universe(config.universe_size, &mut walk);
        Self::with_catalog(config, catalog, walk)
    }

    /// Use an explicit catalog instead of the built-in universe.
    pub fn with_catalog(
        config: EngineConfig,
        catalog: AssetCatalog,
        walk: RandomWalk<R>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let mut generator = Self {
            config,
            walk,
            catalog,
            last_prices: HashMap::new(),
            history: HashMap::new(),
        };
        generator.backfill_history(Utc::now());
        info!(
            "Market generator ready: {} assets, {} history points each",
            generator.catalog.len(),
            generator.config.history_capacity
        );
        Ok(generator)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn universe_size(&self) -> usize {
        self.catalog.len()
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.catalog.get(id)
    }

    /// Last price produced by a snapshot for `id`, if any snapshot ran yet.
    pub fn last_price(&self, id: &str) -> Option<f64> {
        self.last_prices.get(id).copied()
    }

    /// Number of history points currently buffered for `id`.
    pub fn history_len(&self, id: &str) -> usize {
        self.history.get(id).map_or(0, VecDeque::len)
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Full market snapshot in catalog order.
    pub fn generate_snapshot(&mut self) -> Result<Vec<CoinData>, CoreError> {
        self.generate_snapshot_at(Utc::now())
    }

    /// Full market snapshot stamped with `now`.
    ///
    /// Each asset's last-known price takes one walk step. Market cap is
    /// weighted by inverse catalog position so earlier assets dominate,
    /// while `market_cap_rank` stays `index + 1` without re-sorting.
    pub fn generate_snapshot_at(&mut self, now: DateTime<Utc>) -> Result<Vec<CoinData>, CoreError> {
        let universe = self.catalog.len();
        let volatility = self.config.snapshot_volatility;
        let mut coins = Vec::with_capacity(universe);

        for (index, asset) in self.catalog.assets().iter().enumerate() {
            let last = self
                .last_prices
                .get(&asset.id)
                .copied()
                .unwrap_or(asset.base_price);
            let new_price = self.walk.evolve_price(last, volatility);

            let coin = build_coin(
                &mut self.walk,
                &self.config,
                asset,
                index,
                universe,
                new_price,
                now,
            );
            if !coin.current_price.is_finite() || !coin.market_cap.is_finite() {
                return Err(CoreError::Generation(format!(
                    "non-finite market values for '{}'",
                    asset.id
                )));
            }

            self.last_prices.insert(asset.id.clone(), new_price);
            coins.push(coin);
        }

        debug!("Generated snapshot of {} coins", coins.len());
        Ok(coins)
    }

    /// Cheap live tick: nudge every entry of `snapshot` and record the new
    /// price in that asset's history buffer.
    ///
    /// The 24h change is measured against the entry's own 24h-ago baseline
    /// (`current_price - price_change_24h`), and market cap scales with
    /// the price ratio.
    pub fn apply_incremental_update(&mut self, snapshot: &[CoinData]) -> Result<Vec<CoinData>, CoreError> {
        self.apply_incremental_update_at(snapshot, Utc::now())
    }

    pub fn apply_incremental_update_at(
        &mut self,
        snapshot: &[CoinData],
        now: DateTime<Utc>,
    ) -> Result<Vec<CoinData>, CoreError> {
        let volatility = self.config.tick_volatility;
        let capacity = self.config.history_capacity;
        let now_ms = now.timestamp_millis();

        let mut updated = Vec::with_capacity(snapshot.len());
        for coin in snapshot {
            let new_price = self.walk.evolve_price(coin.current_price, volatility);
            if !new_price.is_finite() {
                return Err(CoreError::Generation(format!(
                    "non-finite tick price for '{}'",
                    coin.id
                )));
            }

            let baseline = coin.price_24h_ago();
            let change = new_price - baseline;
            let change_pct = if baseline != 0.0 {
                change / baseline * 100.0
            } else {
                0.0
            };
            let ratio = if coin.current_price > 0.0 {
                new_price / coin.current_price
            } else {
                1.0
            };
            let market_cap = coin.market_cap * ratio;

            if let Some(buffer) = self.history.get_mut(&coin.id) {
                buffer.push_back(PriceHistoryPoint {
                    timestamp: now_ms,
                    price: round_price(new_price),
                    market_cap: round_dollars(market_cap),
                    total_volume: coin.total_volume,
                });
                while buffer.len() > capacity {
                    buffer.pop_front();
                }
            }

            updated.push(CoinData {
                current_price: round_price(new_price),
                price_change_24h: round_price(change),
                price_change_percentage_24h: round_to(change_pct, 2),
                market_cap: round_dollars(market_cap),
                last_updated: now,
                ..coin.clone()
            });
        }

        Ok(updated)
    }

    // ── History ─────────────────────────────────────────────────────

    /// Hourly history of `asset_id` within `range`, oldest first.
    /// Unknown ids yield an empty series.
    pub fn history(&self, asset_id: &str, range: TimeRange) -> Vec<PriceHistoryPoint> {
        self.history_at(asset_id, range, Utc::now().timestamp_millis())
    }

    pub fn history_at(&self, asset_id: &str, range: TimeRange, now_ms: i64) -> Vec<PriceHistoryPoint> {
        let cutoff = range.cutoff(now_ms);
        self.history
            .get(asset_id)
            .map(|buffer| {
                buffer
                    .iter()
                    .filter(|p| p.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// OHLCV bars of 4 consecutive history points; a trailing partial
    /// bucket is dropped.
    pub fn candlesticks(&self, asset_id: &str, range: TimeRange) -> Vec<Candlestick> {
        self.candlesticks_at(asset_id, range, Utc::now().timestamp_millis())
    }

    pub fn candlesticks_at(&self, asset_id: &str, range: TimeRange, now_ms: i64) -> Vec<Candlestick> {
        let points = self.history_at(asset_id, range, now_ms);
        points
            .chunks_exact(CANDLE_BUCKET)
            .map(|bucket| {
                let high = bucket.iter().map(|p| p.price).fold(f64::MIN, f64::max);
                let low = bucket.iter().map(|p| p.price).fold(f64::MAX, f64::min);
                let volume =
                    bucket.iter().map(|p| p.total_volume).sum::<f64>() / bucket.len() as f64;
                Candlestick {
                    timestamp: bucket[0].timestamp,
                    open: round_price(bucket[0].price),
                    high: round_price(high),
                    low: round_price(low),
                    close: round_price(bucket[bucket.len() - 1].price),
                    volume: round_dollars(volume),
                }
            })
            .collect()
    }

    /// Walk each asset forward one hour at a time so the buffer ends at `now`.
    fn backfill_history(&mut self, now: DateTime<Utc>) {
        let capacity = self.config.history_capacity;
        let volatility = self.config.backfill_volatility;
        let now_ms = now.timestamp_millis();

        for asset in self.catalog.assets() {
            let mut buffer = VecDeque::with_capacity(capacity + 1);
            let mut price = asset.base_price;

            for hours_ago in (0..capacity as i64).rev() {
                price = self.walk.evolve_price(price, volatility);
                let market_cap = price * (1_000_000.0 + self.walk.uniform() * 100_000_000.0);
                let total_volume = market_cap * (0.02 + self.walk.uniform() * 0.08);
                buffer.push_back(PriceHistoryPoint {
                    timestamp: now_ms - hours_ago * HOUR_MS,
                    price: round_price(price),
                    market_cap: round_dollars(market_cap),
                    total_volume: round_dollars(total_volume),
                });
            }

            self.history.insert(asset.id.clone(), buffer);
        }

        debug!(
            "Backfilled {} hourly points for {} assets",
            capacity,
            self.catalog.len()
        );
    }

    // ── Aggregates & queries ────────────────────────────────────────

    /// Aggregate stats over a freshly generated snapshot.
    ///
    /// This advances every price by one snapshot step, so the totals may
    /// not match a snapshot the caller is already displaying.
    pub fn compute_stats(&mut self) -> Result<MarketStats, CoreError> {
        let coins = self.generate_snapshot()?;

        let total_market_cap: f64 = coins.iter().map(|c| c.market_cap).sum();
        let total_volume_24h: f64 = coins.iter().map(|c| c.total_volume).sum();

        let cap_of = |id: &str| {
            coins
                .iter()
                .find(|c| c.id == id)
                .map_or(0.0, |c| c.market_cap)
        };
        let dominance = |cap: f64| {
            if total_market_cap > 0.0 {
                round_to(cap / total_market_cap * 100.0, 2)
            } else {
                0.0
            }
        };
        let btc_dominance = dominance(cap_of(&self.config.btc_reference_id));
        let eth_dominance = dominance(cap_of(&self.config.eth_reference_id));

        let market_cap_change_24h = total_market_cap * (self.walk.uniform() - 0.5) * 0.05;
        let volume_change_24h = total_volume_24h * (self.walk.uniform() - 0.5) * 0.1;
        let markets = 500 + (self.walk.uniform() * 100.0).floor() as u32;
        let change_pct = if total_market_cap > 0.0 {
            market_cap_change_24h / total_market_cap * 100.0
        } else {
            0.0
        };

        Ok(MarketStats {
            total_market_cap: round_dollars(total_market_cap),
            total_volume_24h: round_dollars(total_volume_24h),
            market_cap_change_24h: round_dollars(market_cap_change_24h),
            volume_change_24h: round_dollars(volume_change_24h),
            btc_dominance,
            eth_dominance,
            active_coins: coins.len(),
            markets,
            total_market_cap_change_percentage_24h: round_to(change_pct, 2),
        })
    }

    /// Case-insensitive substring search over id, symbol and name of a
    /// freshly generated snapshot, truncated to `limit`.
    pub fn search(&mut self, query: &str, limit: usize) -> Result<Vec<CoinData>, CoreError> {
        let needle = query.to_lowercase();
        let coins = self.generate_snapshot()?;
        Ok(coins
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.symbol.to_lowercase().contains(&needle)
                    || c.id.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect())
    }

    /// A small illustrative portfolio valued against a fresh snapshot.
    /// Holdings whose asset is not in the universe are skipped.
    pub fn sample_portfolio(&mut self) -> Result<Vec<HoldingSummary>, CoreError> {
        let now = Utc::now();
        let coins = self.generate_snapshot_at(now)?;

        let mut summaries = Vec::new();
        for (coin_id, amount, purchase_price) in SAMPLE_HOLDINGS {
            if !coins.iter().any(|c| c.id == *coin_id) {
                continue;
            }
            let days_ago = self.walk.uniform() * 180.0;
            let purchase_date = now - Duration::milliseconds((days_ago * DAY_MS) as i64);
            let holding = Holding::new(*amount, *purchase_price, purchase_date);
            summaries.push(valuation::summarize_holding(coin_id, &holding, &coins));
        }
        Ok(summaries)
    }
}

/// Derive one snapshot row around `price`.
fn build_coin<R: Rng>(
    walk: &mut RandomWalk<R>,
    config: &EngineConfig,
    asset: &Asset,
    index: usize,
    universe: usize,
    price: f64,
    now: DateTime<Utc>,
) -> CoinData {
    // ±10% synthetic 24h move
    let change_24h = (walk.uniform() - 0.5) * 0.2;
    let price_24h_ago = price / (1.0 + change_24h);

    let supply_multiplier = 1_000_000.0 + walk.uniform() * 100_000_000.0;
    let rank_weight = (universe + 1 - index) as f64 / 100.0;
    let market_cap = price * supply_multiplier * rank_weight;
    let total_volume = market_cap * (0.02 + walk.uniform() * 0.1);

    let high_24h = price * (1.0 + walk.uniform() * 0.05);
    let low_24h = price * (1.0 - walk.uniform() * 0.05);

    // Walk backward from the new price, then flip to oldest-first.
    let mut sparkline = Vec::with_capacity(config.sparkline_points);
    let mut point = price;
    for _ in 0..config.sparkline_points {
        point = walk.evolve_price(point, config.sparkline_volatility);
        sparkline.push(round_price(point));
    }
    sparkline.reverse();

    let fully_diluted_valuation = Some(market_cap * (1.0 + walk.uniform() * 0.2));
    let circulating_supply = market_cap / price;
    let total_supply = if walk.uniform() > 0.3 {
        Some(circulating_supply * (1.0 + walk.uniform() * 0.5))
    } else {
        None
    };
    let max_supply = if walk.uniform() > 0.5 {
        Some(circulating_supply * (1.0 + walk.uniform()))
    } else {
        None
    };

    let ath = round_price(price * (1.0 + walk.uniform() * 5.0));
    let ath_change_percentage = round_to(-walk.uniform() * 80.0, 2);
    let ath_date = now - Duration::milliseconds((walk.uniform() * 365.0 * DAY_MS) as i64);
    let atl = round_price(price * walk.uniform() * 0.1);
    let atl_change_percentage = round_to(walk.uniform() * 1000.0 + 100.0, 2);
    let atl_date = now - Duration::milliseconds((walk.uniform() * 1000.0 * DAY_MS) as i64);

    let change_pct = round_to(change_24h * 100.0, 2);

    CoinData {
        id: asset.id.clone(),
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        image: format!(
            "https://coin-images.coingecko.com/coins/images/{}/small/{}.png",
            index + 1,
            asset.id
        ),
        current_price: round_price(price),
        market_cap: round_dollars(market_cap),
        market_cap_rank: (index + 1) as u32,
        fully_diluted_valuation,
        total_volume: round_dollars(total_volume),
        high_24h: round_price(high_24h),
        low_24h: round_price(low_24h),
        price_change_24h: round_price(price - price_24h_ago),
        price_change_percentage_24h: change_pct,
        market_cap_change_24h: market_cap * change_24h,
        market_cap_change_percentage_24h: change_pct,
        circulating_supply,
        total_supply,
        max_supply,
        ath,
        ath_change_percentage,
        ath_date,
        atl,
        atl_change_percentage,
        atl_date,
        last_updated: now,
        sparkline,
    }
}
