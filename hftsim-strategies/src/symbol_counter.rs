//! Per-symbol add-order counter

use std::collections::HashMap;
use std::fmt::Write;

use hftsim_core::core::{Message, Symbol};
use hftsim_core::Strategy;

/// Counts add orders (plain and attributed) per symbol
///
/// Keys are the raw 8-byte symbols, so counting never allocates after a
/// symbol's first appearance.
#[derive(Debug, Default)]
pub struct SymbolCounter {
    counts: HashMap<Symbol, u64>,
    total: u64,
}

impl SymbolCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add orders seen for `symbol`
    pub fn count(&self, symbol: &str) -> u64 {
        self.counts.get(&Symbol::new(symbol)).copied().unwrap_or(0)
    }

    /// Add orders seen across all symbols
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Counts sorted by symbol
    pub fn counts(&self) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(sym, n)| (sym.as_str().into_owned(), *n))
            .collect();
        out.sort();
        out
    }
}

impl Strategy for SymbolCounter {
    #[inline]
    fn on_message(&mut self, msg: &Message) {
        if msg.is_add_order() {
            *self.counts.entry(msg.symbol).or_insert(0) += 1;
            self.total += 1;
        }
    }

    fn name(&self) -> &'static str {
        "SymbolCounter"
    }

    fn report(&self) -> String {
        let mut out = format!("add orders: {}", self.total);
        for (symbol, count) in self.counts() {
            let _ = write!(out, ", {}={}", symbol, count);
        }
        out
    }

    fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}
