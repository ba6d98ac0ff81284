//! Test helper utilities for creating test data and assertions
//!
//! Provides convenient builders and utilities for:
//! - Message creation (add orders, trades, cancels)
//! - Capture sequences with controlled timestamps
//! - Polling with a deadline for cross-thread assertions
//! - Latency assertions

use std::time::{Duration, Instant};

use crate::core::{Message, MessageKind, Side};
use crate::data::CapturedMessage;

/// Create a valid buy-side add order
pub fn add_order(symbol: &str, price: f64, size: u32, sequence: u64) -> Message {
    Message {
        kind: MessageKind::AddOrder,
        order_id: sequence as u32,
        symbol: symbol.into(),
        size,
        price,
        side: Side::Buy,
        timestamp_ns: sequence * 1_000,
        sequence,
    }
}

/// Create an add order on the given side
pub fn add_order_side(symbol: &str, price: f64, size: u32, side: Side, sequence: u64) -> Message {
    Message {
        side,
        ..add_order(symbol, price, size, sequence)
    }
}

/// Create a trade message
pub fn trade(symbol: &str, price: f64, size: u32, sequence: u64) -> Message {
    Message {
        kind: MessageKind::Trade,
        ..add_order(symbol, price, size, sequence)
    }
}

/// Create a cancel message for an earlier order
pub fn cancel(symbol: &str, order_id: u32, sequence: u64) -> Message {
    Message {
        kind: MessageKind::OrderCanceled,
        order_id,
        ..add_order(symbol, 1.0, 1, sequence)
    }
}

/// Wrap messages as a capture with the given recorded timestamps
pub fn captured(timestamps_ns: &[u64]) -> Vec<CapturedMessage> {
    timestamps_ns
        .iter()
        .enumerate()
        .map(|(i, &ts)| {
            let seq = i as u64 + 1;
            CapturedMessage {
                timestamp_ns: ts,
                message: Message {
                    timestamp_ns: ts,
                    ..add_order("AAPL", 150.0, 100, seq)
                },
            }
        })
        .collect()
}

/// A core id outside this process's affinity set
pub fn unavailable_core() -> usize {
    crate::perf::cpu::allowed_cores()
        .last()
        .map_or(0, |max| max + 1)
}

/// Poll `condition` until it holds or `timeout` elapses
///
/// Returns whether the condition was met.
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Assert that an operation completes within expected latency
pub fn assert_within_latency<F>(max_latency: Duration, operation: F, operation_name: &str)
where
    F: FnOnce(),
{
    let start = Instant::now();
    operation();
    let elapsed = start.elapsed();

    assert!(
        elapsed <= max_latency,
        "{} took {:?}, expected <= {:?}",
        operation_name,
        elapsed,
        max_latency
    );
}
