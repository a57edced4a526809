use rand::Rng;

use crate::models::asset::Asset;
use crate::services::random_walk::RandomWalk;

/// Fixed head of the universe: (id, symbol, name, base price).
pub const FIXED_ASSETS: &[(&str, &str, &str, f64)] = &[
    ("bitcoin", "btc", "Bitcoin", 43_000.0),
    ("ethereum", "eth", "Ethereum", 2_500.0),
    ("binancecoin", "bnb", "BNB", 300.0),
    ("solana", "sol", "Solana", 100.0),
    ("cardano", "ada", "Cardano", 0.5),
    ("avalanche-2", "avax", "Avalanche", 35.0),
    ("polkadot", "dot", "Polkadot", 7.0),
    ("chainlink", "link", "Chainlink", 15.0),
    ("polygon", "matic", "Polygon", 0.8),
    ("litecoin", "ltc", "Litecoin", 70.0),
    ("near", "near", "NEAR Protocol", 2.5),
    ("uniswap", "uni", "Uniswap", 6.0),
    ("internet-computer", "icp", "Internet Computer", 5.0),
    ("aptos", "apt", "Aptos", 8.0),
    ("arbitrum", "arb", "Arbitrum", 1.2),
    ("optimism", "op", "Optimism", 2.5),
    ("cosmos", "atom", "Cosmos Hub", 10.0),
    ("filecoin", "fil", "Filecoin", 5.0),
    ("hedera-hashgraph", "hbar", "Hedera", 0.06),
    ("vechain", "vet", "VeChain", 0.025),
    ("stellar", "xlm", "Stellar", 0.12),
    ("algorand", "algo", "Algorand", 0.15),
    ("tezos", "xtz", "Tezos", 1.0),
    ("elrond-erd-2", "egld", "MultiversX", 35.0),
    ("flow", "flow", "Flow", 0.7),
];

/// Lowest filler base price.
const FILLER_MIN_PRICE: f64 = 0.001;

/// Width of the filler base-price range.
const FILLER_PRICE_SPAN: f64 = 1_000.0;

/// Ordered, immutable list of the assets the market simulates.
///
/// Built once; filler base prices are drawn at build time and never change.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
}

impl AssetCatalog {
    /// Fixed table followed by `coin-<i>` fillers up to `target_size` entries.
    /// A target smaller than the fixed table truncates it.
    pub fn build_universe<R: Rng>(target_size: usize, walk: &mut RandomWalk<R>) -> Self {
        let mut assets: Vec<Asset> = FIXED_ASSETS
            .iter()
            .take(target_size)
            .map(|(id, symbol, name, price)| Asset::new(*id, *symbol, *name, *price))
            .collect();

        for i in assets.len()..target_size {
            let base_price = walk.uniform() * FILLER_PRICE_SPAN + FILLER_MIN_PRICE;
            assets.push(Asset::new(
                format!("coin-{i}"),
                format!("c{i}"),
                format!("Crypto {i}"),
                base_price,
            ));
        }

        Self { assets }
    }

    /// Wrap an explicit asset list (e.g., a curated test universe).
    pub fn from_assets(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Zero-based catalog position of `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.id == id)
    }
}
