use serde::{Deserialize, Serialize};

/// An entry of the asset catalog: one tradeable coin in the simulated universe.
///
/// **Equality and hashing** are based solely on `id`, NOT on the display
/// fields or the seed price. Ids are unique across the universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique key, lowercase (e.g., "bitcoin", "avalanche-2", "coin-42")
    pub id: String,

    /// Ticker symbol, lowercase as market APIs report it (e.g., "btc")
    pub symbol: String,

    /// Human-readable name (e.g., "Bitcoin", "Crypto 42")
    pub name: String,

    /// Seed price the random walk starts from (always > 0)
    pub base_price: f64,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        base_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            base_price,
        }
    }
}
