//! Lock-Free Performance Counters
//!
//! Cache-padded atomic counters for zero-overhead statistics.
//! All counters use relaxed ordering: they are advisory only and never
//! drive control flow, so a racing read may lag by a few increments.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Monotonic event counter on its own cache line
///
/// Each counter is padded so that a producer-owned counter and a
/// consumer-owned counter never share a line.
#[derive(Debug, Default)]
pub struct Counter {
    value: CachePadded<AtomicU64>,
}

impl Counter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            value: CachePadded::new(AtomicU64::new(0)),
        }
    }

    #[inline(always)]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Largest value observed so far
///
/// Updated with an optimistic compare-and-swap loop that retries only while
/// the observed value is larger than the stored maximum.
#[derive(Debug, Default)]
pub struct HighWaterMark {
    value: CachePadded<AtomicUsize>,
}

impl HighWaterMark {
    pub const fn new() -> Self {
        Self {
            value: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Record an observation
    #[inline(always)]
    pub fn observe(&self, current: usize) {
        let mut prev = self.value.load(Ordering::Relaxed);
        while current > prev {
            match self.value.compare_exchange_weak(
                prev,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => prev = observed,
            }
        }
    }

    #[inline(always)]
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Relaxed)
    }
}
