//! Micro mean-reversion signal
//!
//! Keeps the last N prices. Once the window is full, a price below the
//! window mean is a Buy, above it a Sell, equal a Hold.

use std::collections::VecDeque;

use hftsim_core::core::{Message, Symbol};
use hftsim_core::Strategy;
use thiserror::Error;

/// Default window length, selectable at compile time
///
/// Available feature flags:
/// - `window-5`
/// - `window-50`
/// - `window-100`
pub const DEFAULT_WINDOW: usize = {
    #[cfg(feature = "window-5")]
    {
        5
    }
    #[cfg(feature = "window-50")]
    {
        50
    }
    #[cfg(feature = "window-100")]
    {
        100
    }
    #[cfg(not(any(feature = "window-5", feature = "window-50", feature = "window-100")))]
    {
        20
    }
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeanReversionError {
    #[error("mean reversion window must hold at least one price")]
    ZeroWindow,
}

/// Trading action derived from the latest price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

/// Rolling-mean reversion over one price stream
///
/// Fed by add orders and trades. With [`with_symbol`](Self::with_symbol)
/// the stream is limited to one instrument; otherwise every symbol feeds
/// the same window.
#[derive(Debug)]
pub struct MicroMeanReversion {
    window: usize,
    prices: VecDeque<f64>,
    symbol: Option<Symbol>,
    last_signal: Signal,
    buys: u64,
    sells: u64,
    holds: u64,
}

impl MicroMeanReversion {
    pub fn new(window: usize) -> Result<Self, MeanReversionError> {
        if window == 0 {
            return Err(MeanReversionError::ZeroWindow);
        }
        Ok(Self {
            window,
            prices: VecDeque::with_capacity(window),
            symbol: None,
            last_signal: Signal::Hold,
            buys: 0,
            sells: 0,
            holds: 0,
        })
    }

    /// Only react to messages for `symbol`
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(Symbol::new(symbol));
        self
    }

    /// Push a price and return the resulting signal
    pub fn on_price(&mut self, price: f64) -> Signal {
        if self.prices.len() == self.window {
            self.prices.pop_front();
        }
        self.prices.push_back(price);

        let signal = if self.prices.len() < self.window {
            Signal::Hold
        } else {
            let mean = self.prices.iter().sum::<f64>() / self.window as f64;
            if price < mean {
                Signal::Buy
            } else if price > mean {
                Signal::Sell
            } else {
                Signal::Hold
            }
        };

        match signal {
            Signal::Buy => self.buys += 1,
            Signal::Sell => self.sells += 1,
            Signal::Hold => self.holds += 1,
        }
        self.last_signal = signal;
        signal
    }

    /// Mean of the current window, once full
    pub fn mean(&self) -> Option<f64> {
        (self.prices.len() == self.window)
            .then(|| self.prices.iter().sum::<f64>() / self.window as f64)
    }

    pub fn last_signal(&self) -> Signal {
        self.last_signal
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// (buys, sells, holds) emitted so far
    pub fn signal_counts(&self) -> (u64, u64, u64) {
        (self.buys, self.sells, self.holds)
    }
}

impl Default for MicroMeanReversion {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            prices: VecDeque::with_capacity(DEFAULT_WINDOW),
            symbol: None,
            last_signal: Signal::Hold,
            buys: 0,
            sells: 0,
            holds: 0,
        }
    }
}

impl Strategy for MicroMeanReversion {
    #[inline]
    fn on_message(&mut self, msg: &Message) {
        if !(msg.is_add_order() || msg.is_trade()) {
            return;
        }
        if self.symbol.is_some_and(|s| s != msg.symbol) {
            return;
        }
        self.on_price(msg.price);
    }

    fn name(&self) -> &'static str {
        "MicroMeanReversion"
    }

    fn report(&self) -> String {
        let mean = self
            .mean()
            .map_or_else(|| "warming up".to_string(), |m| format!("{:.4}", m));
        format!(
            "window: {}, mean: {}, last: {:?}, buys: {}, sells: {}, holds: {}",
            self.window, mean, self.last_signal, self.buys, self.sells, self.holds
        )
    }

    fn reset(&mut self) {
        self.prices.clear();
        self.last_signal = Signal::Hold;
        self.buys = 0;
        self.sells = 0;
        self.holds = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hftsim_core::testing::{add_order, cancel};

    #[test]
    fn test_zero_window_rejected() {
        assert_eq!(
            MicroMeanReversion::new(0).unwrap_err(),
            MeanReversionError::ZeroWindow
        );
    }

    #[test]
    fn test_holds_until_window_full() {
        let mut mr = MicroMeanReversion::new(3).unwrap();
        assert_eq!(mr.on_price(100.0), Signal::Hold);
        assert_eq!(mr.on_price(90.0), Signal::Hold);
        assert!(mr.mean().is_none());
        // [100, 90, 80] mean 90, 80 < 90
        assert_eq!(mr.on_price(80.0), Signal::Buy);
        assert_relative_eq!(mr.mean().unwrap(), 90.0);
    }

    #[test]
    fn test_sell_and_hold() {
        let mut mr = MicroMeanReversion::new(2).unwrap();
        mr.on_price(100.0);
        // [100, 110] mean 105
        assert_eq!(mr.on_price(110.0), Signal::Sell);
        // [110, 110] mean 110
        assert_eq!(mr.on_price(110.0), Signal::Hold);
        assert_eq!(mr.signal_counts(), (0, 1, 2));
    }

    #[test]
    fn test_window_of_one_always_holds() {
        let mut mr = MicroMeanReversion::new(1).unwrap();
        for p in [1.0, 5.0, 2.0] {
            assert_eq!(mr.on_price(p), Signal::Hold);
        }
    }

    #[test]
    fn test_symbol_filter_and_message_kinds() {
        let mut mr = MicroMeanReversion::new(2).unwrap().with_symbol("AAPL");
        mr.on_message(&add_order("AAPL", 100.0, 1, 1));
        mr.on_message(&add_order("MSFT", 1.0, 1, 2));
        mr.on_message(&cancel("AAPL", 1, 3));
        mr.on_message(&add_order("AAPL", 90.0, 1, 4));

        assert_eq!(mr.last_signal(), Signal::Buy);
        assert_relative_eq!(mr.mean().unwrap(), 95.0);
    }

    #[test]
    fn test_default_window() {
        assert_eq!(MicroMeanReversion::default().window(), DEFAULT_WINDOW);
        assert!(DEFAULT_WINDOW > 0);
    }
}
