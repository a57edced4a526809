use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a price alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Fires when the price is at or above the threshold
    Above,
    /// Fires when the price is at or below the threshold
    Below,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Above => write!(f, "above"),
            AlertKind::Below => write!(f, "below"),
        }
    }
}

/// A user-defined price threshold on one coin.
///
/// Triggered state is never stored: it is recomputed from the live price
/// each time it is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub coin_id: String,
    pub price: f64,
    pub kind: AlertKind,
    pub active: bool,
}

impl PriceAlert {
    /// New alerts start active.
    pub fn new(coin_id: impl Into<String>, price: f64, kind: AlertKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            coin_id: coin_id.into(),
            price,
            kind,
            active: true,
        }
    }

    /// Whether `current_price` crosses this alert's threshold.
    /// Inactive alerts never trigger.
    pub fn is_triggered_by(&self, current_price: f64) -> bool {
        if !self.active {
            return false;
        }
        match self.kind {
            AlertKind::Above => current_price >= self.price,
            AlertKind::Below => current_price <= self.price,
        }
    }
}
