use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user's recorded position in one asset.
///
/// **Important**: holdings do NOT store current value. Valuation is derived
/// from the live snapshot every time it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Units held (always > 0)
    pub amount: f64,

    /// Unit price paid when the holding was recorded (always > 0)
    pub purchase_price: f64,

    /// When the holding was recorded
    pub purchase_date: DateTime<Utc>,
}

impl Holding {
    pub fn new(amount: f64, purchase_price: f64, purchase_date: DateTime<Utc>) -> Self {
        Self {
            amount,
            purchase_price,
            purchase_date,
        }
    }

    /// Cost basis of the whole position.
    pub fn invested_value(&self) -> f64 {
        self.purchase_price * self.amount
    }
}

/// Holdings keyed by asset id. At most one holding per asset.
pub type Portfolio = BTreeMap<String, Holding>;

/// Derived valuation of a single holding against the live snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub coin_id: String,

    /// Empty when the asset is missing from the snapshot
    pub symbol: String,
    pub name: String,

    pub amount: f64,
    pub purchase_price: f64,
    pub purchase_date: DateTime<Utc>,

    /// 0 when the asset is missing from the snapshot
    pub current_price: f64,

    /// current_price × amount
    pub current_value: f64,

    /// purchase_price × amount
    pub invested_value: f64,

    /// current_value − invested_value
    pub gain_loss: f64,

    /// gain_loss / invested_value × 100 (0 when nothing was invested)
    pub gain_loss_percentage: f64,
}
