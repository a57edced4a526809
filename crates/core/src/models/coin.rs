use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a market snapshot: the full market picture of a single coin.
///
/// Regenerated on every snapshot and patched in place by live ticks.
/// Field names follow the usual market-API layout so the presentation
/// layer can bind to them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinData {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,

    /// Latest unit price, rounded to 6 decimals (always > 0)
    pub current_price: f64,
    /// Rounded to whole dollars
    pub market_cap: f64,
    /// 1-based, fixed by catalog position
    pub market_cap_rank: u32,
    pub fully_diluted_valuation: Option<f64>,
    /// Rounded to whole dollars
    pub total_volume: f64,

    pub high_24h: f64,
    pub low_24h: f64,
    pub price_change_24h: f64,
    pub price_change_percentage_24h: f64,
    pub market_cap_change_24h: f64,
    pub market_cap_change_percentage_24h: f64,

    pub circulating_supply: f64,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,

    /// All-time high and the current price's distance from it
    pub ath: f64,
    pub ath_change_percentage: f64,
    pub ath_date: DateTime<Utc>,

    /// All-time low and the current price's distance from it
    pub atl: f64,
    pub atl_change_percentage: f64,
    pub atl_date: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,

    /// Short recent-price series for compact trend rendering (oldest first)
    pub sparkline: Vec<f64>,
}

impl CoinData {
    /// The price 24 hours ago implied by the stored 24h change.
    pub fn price_24h_ago(&self) -> f64 {
        self.current_price - self.price_change_24h
    }
}
