use serde::{Deserialize, Serialize};

/// Aggregate statistics over one market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// Sum of all market caps (whole dollars)
    pub total_market_cap: f64,

    /// Sum of all 24h volumes (whole dollars)
    pub total_volume_24h: f64,

    pub market_cap_change_24h: f64,
    pub volume_change_24h: f64,

    /// Bitcoin's share of total market cap, in percent
    pub btc_dominance: f64,

    /// Ethereum's share of total market cap, in percent
    pub eth_dominance: f64,

    /// Number of coins in the snapshot
    pub active_coins: usize,

    /// Number of simulated trading venues
    pub markets: u32,

    pub total_market_cap_change_percentage_24h: f64,
}
