//! HftSim Strategies - callbacks for the ring consumer
//!
//! Every strategy implements [`hftsim_core::Strategy`] and runs on the
//! consumer thread, one message at a time.
//!
//! ## Available Strategies
//!
//! ### [`SymbolCounter`]
//! Counts add orders per symbol.
//!
//! ### [`BuySellCounter`]
//! Counts buy and sell side messages and tracks the last price per symbol.
//!
//! ### [`MicroMeanReversion`]
//! Rolling mean of the last N prices; Buy below the mean, Sell above it.
//!
//! **Configuration:**
//! ```toml
//! hftsim-strategies = { features = ["window-50"] }
//! ```

pub mod buy_sell;
pub mod mean_reversion;
pub mod symbol_counter;

pub use buy_sell::BuySellCounter;
pub use mean_reversion::{MeanReversionError, MicroMeanReversion, Signal, DEFAULT_WINDOW};
pub use symbol_counter::SymbolCounter;

use hftsim_core::Strategy;

/// Strategy selectable by name from the command line
pub fn by_name(name: &str) -> Option<Box<dyn Strategy + Send>> {
    match name {
        "symbol-counter" => Some(Box::new(SymbolCounter::new())),
        "buy-sell" => Some(Box::new(BuySellCounter::new())),
        "mean-reversion" => Some(Box::new(MicroMeanReversion::default())),
        _ => None,
    }
}

/// Names accepted by [`by_name`]
pub const STRATEGY_NAMES: &[&str] = &["symbol-counter", "buy-sell", "mean-reversion"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        for name in STRATEGY_NAMES {
            assert!(by_name(name).is_some(), "{} not constructible", name);
        }
        assert!(by_name("martingale").is_none());
    }
}
