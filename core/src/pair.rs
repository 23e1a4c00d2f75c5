use serde::{Deserialize, Serialize};

/// An asset code, e.g. `"USDT"` or `"BTC"`.
pub type Asset = String;

/// A tradable instrument. Immutable for the lifetime of a run — the
/// pair universe is loaded once at startup (see `market::PairIndex`)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// Exchange symbol, e.g. `"BTCUSDT"`.
    pub name: String,
    pub base: Asset,
    pub quote: Asset,
    pub enabled: bool,
    pub base_precision: u32,
    pub quote_precision: u32,
    pub step_size: f64,
    pub tick_size: f64,
    /// Minimum tradable notional in quote-asset units. Supplements the
    /// exchange metadata the distilled spec did not name explicitly;
    /// used only as an extra evaluator rejection rule.
    pub min_notional: f64,
}

impl Pair {
    pub fn new(name: impl Into<String>, base: impl Into<Asset>, quote: impl Into<Asset>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            quote: quote.into(),
            enabled: true,
            base_precision: 8,
            quote_precision: 8,
            step_size: 0.000_001,
            tick_size: 0.000_001,
            min_notional: 0.0,
        }
    }

    /// Rounds `qty` down to the nearest multiple of `step_size`.
    pub fn round_to_step(&self, qty: f64) -> f64 {
        if self.step_size <= 0.0 {
            return qty;
        }
        (qty / self.step_size).floor() * self.step_size
    }
}

/// Which side of a pair's book a leg trades against.
///
/// `Buy` consumes asks (pays quote, receives base).
/// `Sell` consumes bids (pays base, receives quote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_step_floors_to_nearest_multiple() {
        let mut p = Pair::new("BTCUSDT", "BTC", "USDT");
        p.step_size = 0.001;
        assert_eq!(p.round_to_step(1.2347), 1.234);
        assert_eq!(p.round_to_step(1.0), 1.0);
    }

    #[test]
    fn round_to_step_is_a_noop_for_non_positive_step_size() {
        let mut p = Pair::new("BTCUSDT", "BTC", "USDT");
        p.step_size = 0.0;
        assert_eq!(p.round_to_step(1.23456), 1.23456);
    }

    #[test]
    fn side_opposite_is_involutive() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Buy.opposite().opposite(), Side::Buy);
    }
}
