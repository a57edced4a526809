use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::CoreError;

/// Probability that a perturbation step also carries a large trend jump.
const TREND_PROBABILITY: f64 = 0.05;

/// Standard deviation of the rare trend jump.
const TREND_VOLATILITY: f64 = 0.15;

/// Number of decimals kept on unit prices.
pub const PRICE_DECIMALS: i32 = 6;

/// Smallest price the engine will publish (one unit of the last kept decimal).
pub const PRICE_FLOOR: f64 = 1e-6;

/// Random-walk primitives over a substitutable uniform source.
///
/// Any `rand::Rng` drives the walk; production code seeds a `StdRng` from
/// OS entropy, tests use `StdRng::seed_from_u64` for reproducible runs.
#[derive(Debug)]
pub struct RandomWalk<R: Rng = StdRng> {
    rng: R,
}

impl RandomWalk<StdRng> {
    /// Walk seeded from OS entropy.
    pub fn from_entropy() -> Result<Self, CoreError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)?;
        Ok(Self::new(StdRng::from_seed(seed)))
    }

    /// Deterministic walk for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomWalk<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform sample in `(0, 1]`; never zero, so it is safe under `ln`.
    pub fn uniform_nonzero(&mut self) -> f64 {
        1.0 - self.rng.gen::<f64>()
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// One normal sample via the Box-Muller transform.
    pub fn sample_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u = self.uniform_nonzero();
        let v = self.uniform_nonzero();
        let z0 = (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos();
        z0 * std_dev + mean
    }

    /// One random-walk step: `price * (1 + delta + trend)`.
    ///
    /// `delta ~ N(0, base_volatility)`; `trend` is zero 95% of the time and
    /// `N(0, 0.15)` otherwise. The result is NOT clamped and can be
    /// non-positive; use [`RandomWalk::evolve_price`] for a publishable price.
    pub fn perturb_price(&mut self, current_price: f64, base_volatility: f64) -> f64 {
        let delta = self.sample_gaussian(0.0, base_volatility);
        let trend = if self.chance(TREND_PROBABILITY) {
            self.sample_gaussian(0.0, TREND_VOLATILITY)
        } else {
            0.0
        };
        current_price * (1.0 + delta + trend)
    }

    /// [`RandomWalk::perturb_price`] clamped to [`PRICE_FLOOR`].
    pub fn evolve_price(&mut self, current_price: f64, base_volatility: f64) -> f64 {
        clamp_price(self.perturb_price(current_price, base_volatility))
    }
}

/// Floor a price at [`PRICE_FLOOR`]; NaN also maps to the floor.
pub fn clamp_price(price: f64) -> f64 {
    if price.is_nan() {
        PRICE_FLOOR
    } else {
        price.max(PRICE_FLOOR)
    }
}

/// Round to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a unit price to 6 decimals.
pub fn round_price(value: f64) -> f64 {
    round_to(value, PRICE_DECIMALS)
}

/// Round a dollar aggregate (market cap, volume) to whole units.
pub fn round_dollars(value: f64) -> f64 {
    value.round()
}
