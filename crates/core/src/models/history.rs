use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// A single hourly point of an asset's rolling price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
}

/// OHLCV bar built from consecutive history points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candlestick {
    /// Timestamp of the first point in the bucket (epoch ms)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Mean volume over the bucket
    pub volume: f64,
}

/// Symbolic chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "1D")]
    OneDay,
    #[default]
    #[serde(rename = "7D")]
    SevenDays,
    #[serde(rename = "30D", alias = "1M")]
    ThirtyDays,
    #[serde(rename = "90D", alias = "3M")]
    NinetyDays,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl TimeRange {
    /// Every range, narrowest first.
    pub const ALL_RANGES: [TimeRange; 7] = [
        TimeRange::OneHour,
        TimeRange::OneDay,
        TimeRange::SevenDays,
        TimeRange::ThirtyDays,
        TimeRange::NinetyDays,
        TimeRange::OneYear,
        TimeRange::All,
    ];

    /// How far back (in hours) this window reaches from "now".
    pub fn hours_back(self) -> i64 {
        match self {
            TimeRange::OneHour => 1,
            TimeRange::OneDay => 24,
            TimeRange::SevenDays => 24 * 7,
            TimeRange::ThirtyDays => 24 * 30,
            TimeRange::NinetyDays => 24 * 90,
            TimeRange::OneYear => 24 * 365,
            TimeRange::All => 24 * 365 * 5,
        }
    }

    /// Cutoff timestamp (epoch ms) for this window relative to `now_ms`.
    pub fn cutoff(self, now_ms: i64) -> i64 {
        now_ms - self.hours_back() * 60 * 60 * 1000
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TimeRange::OneHour => "1H",
            TimeRange::OneDay => "1D",
            TimeRange::SevenDays => "7D",
            TimeRange::ThirtyDays => "30D",
            TimeRange::NinetyDays => "90D",
            TimeRange::OneYear => "1Y",
            TimeRange::All => "ALL",
        };
        write!(f, "{label}")
    }
}

impl FromStr for TimeRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1H" => Ok(TimeRange::OneHour),
            "1D" => Ok(TimeRange::OneDay),
            "7D" => Ok(TimeRange::SevenDays),
            "30D" | "1M" => Ok(TimeRange::ThirtyDays),
            "90D" | "3M" => Ok(TimeRange::NinetyDays),
            "1Y" => Ok(TimeRange::OneYear),
            "ALL" => Ok(TimeRange::All),
            _ => Err(CoreError::UnknownTimeRange(s.to_string())),
        }
    }
}
