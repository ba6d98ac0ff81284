//! Buy/sell tally with last price per symbol

use std::collections::HashMap;
use std::fmt::Write;

use hftsim_core::core::{Message, Side, Symbol};
use hftsim_core::Strategy;

/// Counts buy and sell side messages and remembers the last price seen for
/// each symbol
#[derive(Debug, Default)]
pub struct BuySellCounter {
    buys: u64,
    sells: u64,
    last_price: HashMap<Symbol, f64>,
}

impl BuySellCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buys(&self) -> u64 {
        self.buys
    }

    pub fn sells(&self) -> u64 {
        self.sells
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.last_price.get(&Symbol::new(symbol)).copied()
    }
}

impl Strategy for BuySellCounter {
    #[inline]
    fn on_message(&mut self, msg: &Message) {
        self.last_price.insert(msg.symbol, msg.price);
        match msg.side {
            Side::Buy => self.buys += 1,
            Side::Sell => self.sells += 1,
            Side::Unknown => {}
        }
    }

    fn name(&self) -> &'static str {
        "BuySellCounter"
    }

    fn report(&self) -> String {
        let mut out = format!("buys: {}, sells: {}", self.buys, self.sells);
        let mut prices: Vec<_> = self.last_price.iter().collect();
        prices.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        for (symbol, price) in prices {
            let _ = write!(out, ", {} last {:.2}", symbol, price);
        }
        out
    }

    fn reset(&mut self) {
        self.buys = 0;
        self.sells = 0;
        self.last_price.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hftsim_core::testing::add_order_side;

    #[test]
    fn test_counts_sides() {
        let mut strategy = BuySellCounter::new();
        strategy.on_message(&add_order_side("AAPL", 150.0, 1, Side::Buy, 1));
        strategy.on_message(&add_order_side("AAPL", 150.5, 1, Side::Sell, 2));
        strategy.on_message(&add_order_side("AAPL", 151.0, 1, Side::Buy, 3));
        strategy.on_message(&add_order_side("MSFT", 300.0, 1, Side::Unknown, 4));

        assert_eq!(strategy.buys(), 2);
        assert_eq!(strategy.sells(), 1);
        assert_relative_eq!(strategy.last_price("AAPL").unwrap(), 151.0);
        assert_relative_eq!(strategy.last_price("MSFT").unwrap(), 300.0);
        assert!(strategy.last_price("TSLA").is_none());
    }

    #[test]
    fn test_report() {
        let mut strategy = BuySellCounter::new();
        strategy.on_message(&add_order_side("MSFT", 300.0, 1, Side::Sell, 1));
        strategy.on_message(&add_order_side("AAPL", 150.0, 1, Side::Buy, 2));
        assert_eq!(
            strategy.report(),
            "buys: 1, sells: 1, AAPL last 150.00, MSFT last 300.00"
        );
    }
}
