//! Synthetic capture generator
//!
//! Produces a deterministic stream of add orders for replay tests and
//! demos. The same seed always yields the same capture.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::capture::{CaptureWriter, CapturedMessage};
use crate::config::constants::DEFAULT_GENERATOR_GAP_NS;
use crate::core::errors::CaptureError;
use crate::core::message::{Message, MessageKind, Side, Symbol};

/// Symbols cycled through in order
pub const GENERATOR_SYMBOLS: [&str; 5] = ["AAPL", "MSFT", "GOOG", "AMZN", "TSLA"];

/// Default generator seed
pub const DEFAULT_SEED: u64 = 42;

/// Seeded add-order generator
///
/// Prices are whole cents in [100.00, 200.00), sizes in [1, 1000].
/// Sequence numbers start at 1 and timestamps start at 0, spaced by the
/// configured gap.
pub struct CaptureGenerator {
    rng: StdRng,
    gap_ns: u64,
    next_sequence: u64,
    next_timestamp_ns: u64,
}

impl CaptureGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            gap_ns: DEFAULT_GENERATOR_GAP_NS,
            next_sequence: 1,
            next_timestamp_ns: 0,
        }
    }

    /// Set the spacing between consecutive timestamps
    pub fn with_gap_ns(mut self, gap_ns: u64) -> Self {
        self.gap_ns = gap_ns;
        self
    }

    /// Produce the next record
    pub fn next_record(&mut self) -> CapturedMessage {
        let sequence = self.next_sequence;
        let timestamp_ns = self.next_timestamp_ns;
        self.next_sequence += 1;
        self.next_timestamp_ns += self.gap_ns;

        let symbol = GENERATOR_SYMBOLS[(sequence as usize - 1) % GENERATOR_SYMBOLS.len()];
        let cents: u32 = self.rng.gen_range(10_000..20_000);
        let side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };

        let message = Message {
            kind: MessageKind::AddOrder,
            order_id: sequence as u32,
            symbol: Symbol::new(symbol),
            size: self.rng.gen_range(1..=1000),
            price: f64::from(cents) / 100.0,
            side,
            timestamp_ns,
            sequence,
        };

        CapturedMessage::new(timestamp_ns, message)
    }

    /// Generate `count` records into memory
    pub fn generate(&mut self, count: usize) -> Vec<CapturedMessage> {
        (0..count).map(|_| self.next_record()).collect()
    }

    /// Stream `count` records to a capture file
    pub fn write_to<P: AsRef<Path>>(&mut self, path: P, count: usize) -> Result<usize, CaptureError> {
        let mut writer = CaptureWriter::create(path)?;
        for _ in 0..count {
            writer.write(&self.next_record())?;
        }
        writer.finish()
    }
}

impl Default for CaptureGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Iterator for CaptureGenerator {
    type Item = CapturedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_record())
    }
}
