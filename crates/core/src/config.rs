use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Shortest allowed live-tick interval (1 second).
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;

/// Longest allowed live-tick interval (30 seconds).
pub const MAX_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Tunables of the simulated market feed.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of assets in the universe (fixed table + generated fillers)
    pub universe_size: usize,

    /// Hourly points kept per asset; also the backfill length
    pub history_capacity: usize,

    /// Volatility of the per-snapshot random walk step
    pub snapshot_volatility: f64,

    /// Volatility of the live tick step (kept small)
    pub tick_volatility: f64,

    /// Volatility of each hourly backfill step
    pub backfill_volatility: f64,

    /// Volatility of the backward sparkline walk
    pub sparkline_volatility: f64,

    /// Number of sparkline points per coin
    pub sparkline_points: usize,

    /// Simulated latency before a snapshot resolves
    pub snapshot_delay_ms: u64,

    /// Simulated latency before stats resolve
    pub stats_delay_ms: u64,

    /// Simulated latency before a history/candlestick fetch resolves
    pub history_delay_ms: u64,

    /// Period of the aggregate stats refresh
    pub stats_interval_ms: u64,

    /// Live-tick period used until the user picks one
    pub default_refresh_interval_ms: u64,

    /// Asset ids whose market-cap share is reported as dominance
    pub btc_reference_id: String,
    pub eth_reference_id: String,

    /// Default truncation for search results
    pub search_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            universe_size: 100,
            history_capacity: 30 * 24,
            snapshot_volatility: 0.03,
            tick_volatility: 0.002,
            backfill_volatility: 0.015,
            sparkline_volatility: 0.02,
            sparkline_points: 7,
            snapshot_delay_ms: 500,
            stats_delay_ms: 300,
            history_delay_ms: 200,
            stats_interval_ms: 30_000,
            default_refresh_interval_ms: 5_000,
            btc_reference_id: "bitcoin".to_string(),
            eth_reference_id: "ethereum".to_string(),
            search_limit: 50,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Reject configurations the generator cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.universe_size == 0 {
            return Err(CoreError::InvalidConfig(
                "universe_size must be at least 1".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.sparkline_points == 0 {
            return Err(CoreError::InvalidConfig(
                "sparkline_points must be at least 1".into(),
            ));
        }
        let volatilities = [
            ("snapshot_volatility", self.snapshot_volatility),
            ("tick_volatility", self.tick_volatility),
            ("backfill_volatility", self.backfill_volatility),
            ("sparkline_volatility", self.sparkline_volatility),
        ];
        for (name, value) in volatilities {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if self.stats_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "stats_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn snapshot_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_delay_ms)
    }

    pub fn stats_delay(&self) -> Duration {
        Duration::from_millis(self.stats_delay_ms)
    }

    pub fn history_delay(&self) -> Duration {
        Duration::from_millis(self.history_delay_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    /// Same config with every simulated delay set to zero.
    pub fn without_delays(mut self) -> Self {
        self.snapshot_delay_ms = 0;
        self.stats_delay_ms = 0;
        self.history_delay_ms = 0;
        self
    }
}

/// Clamp a user-chosen refresh interval into the supported 1–30 s window.
pub fn clamp_refresh_interval(interval_ms: u64) -> u64 {
    interval_ms.clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS)
}
