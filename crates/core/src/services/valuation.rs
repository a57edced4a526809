use crate::models::alert::PriceAlert;
use crate::models::coin::CoinData;
use crate::models::portfolio::{Holding, HoldingSummary, Portfolio};

/// Values holdings and evaluates alerts against a market snapshot.
///
/// Pure business logic: no I/O, nothing cached. Assets missing from the
/// snapshot count as worth zero rather than failing.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Current price of `coin_id` in `coins`, if listed.
    pub fn price_of(&self, coin_id: &str, coins: &[CoinData]) -> Option<f64> {
        coins
            .iter()
            .find(|c| c.id == coin_id)
            .map(|c| c.current_price)
    }

    /// Σ current price × amount over all holdings.
    pub fn portfolio_value(&self, portfolio: &Portfolio, coins: &[CoinData]) -> f64 {
        portfolio
            .iter()
            .map(|(coin_id, holding)| {
                self.price_of(coin_id, coins)
                    .map_or(0.0, |price| price * holding.amount)
            })
            .sum()
    }

    /// Σ purchase price × amount over all holdings.
    pub fn invested_value(&self, portfolio: &Portfolio) -> f64 {
        portfolio.values().map(Holding::invested_value).sum()
    }

    /// Percentage gain of the whole portfolio over its cost basis.
    /// Defined as 0 when nothing was invested.
    pub fn portfolio_change(&self, portfolio: &Portfolio, coins: &[CoinData]) -> f64 {
        let invested = self.invested_value(portfolio);
        if invested <= 0.0 {
            return 0.0;
        }
        let current = self.portfolio_value(portfolio, coins);
        (current - invested) / invested * 100.0
    }

    /// Per-holding valuation, ordered by coin id.
    pub fn summarize(&self, portfolio: &Portfolio, coins: &[CoinData]) -> Vec<HoldingSummary> {
        portfolio
            .iter()
            .map(|(coin_id, holding)| summarize_holding(coin_id, holding, coins))
            .collect()
    }

    /// Active alerts whose threshold the live price currently crosses.
    /// Alerts on coins missing from the snapshot never trigger.
    pub fn triggered_alerts<'a>(
        &self,
        alerts: &'a [PriceAlert],
        coins: &[CoinData],
    ) -> Vec<&'a PriceAlert> {
        alerts
            .iter()
            .filter(|alert| {
                self.price_of(&alert.coin_id, coins)
                    .is_some_and(|price| alert.is_triggered_by(price))
            })
            .collect()
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Value one holding against `coins`.
pub fn summarize_holding(coin_id: &str, holding: &Holding, coins: &[CoinData]) -> HoldingSummary {
    let coin = coins.iter().find(|c| c.id == coin_id);
    let current_price = coin.map_or(0.0, |c| c.current_price);
    let current_value = current_price * holding.amount;
    let invested_value = holding.invested_value();
    let gain_loss = current_value - invested_value;
    let gain_loss_percentage = if invested_value > 0.0 {
        gain_loss / invested_value * 100.0
    } else {
        0.0
    };

    HoldingSummary {
        coin_id: coin_id.to_string(),
        symbol: coin.map(|c| c.symbol.clone()).unwrap_or_default(),
        name: coin.map(|c| c.name.clone()).unwrap_or_default(),
        amount: holding.amount,
        purchase_price: holding.purchase_price,
        purchase_date: holding.purchase_date,
        current_price,
        current_value,
        invested_value,
        gain_loss,
        gain_loss_percentage,
    }
}
