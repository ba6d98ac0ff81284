//! Compile-time constants for the simulator
//!
//! Sizes that the wire contract or the ring's bitmask depend on are fixed
//! here; everything else has a runtime default in [`super::types`].

use crate::core::wire::WIRE_SIZE;

// ===== RING BUFFER =====

/// Default SPSC ring capacity (power of two)
pub const DEFAULT_RING_CAPACITY: usize = 4096;

/// Ring capacities the binaries are monomorphised for
///
/// The ring capacity is a const generic, so a configured capacity must
/// match one of these.
pub const SUPPORTED_RING_CAPACITIES: &[usize] = &[1024, 2048, 4096, 8192, 16384, 65536];

// ===== NETWORK =====

/// Default UDP port for market data
pub const DEFAULT_UDP_PORT: u16 = 5555;

/// Default replay destination
pub const DEFAULT_REPLAY_ADDR: &str = "127.0.0.1";

/// Receive buffer size; larger than one record so oversize datagrams are
/// detected instead of silently truncated
pub const RECV_BUFFER_SIZE: usize = 2048;

// ===== CAPTURE FILES =====

/// One capture record: big-endian capture timestamp + wire message
pub const CAPTURE_RECORD_SIZE: usize = 8 + WIRE_SIZE;

/// Default capture file
pub const DEFAULT_CAPTURE_FILE: &str = "data/default.itch";

/// Default number of generated messages
pub const DEFAULT_GENERATED_MESSAGES: usize = 10_000;

/// Default spacing between generated messages (1 ms)
pub const DEFAULT_GENERATOR_GAP_NS: u64 = 1_000_000;

// ===== REPLAY =====

/// Real-time replay
pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;

/// Longest single sleep in the replay loop, so `stop()` stays responsive
pub const MAX_REPLAY_SLEEP_NS: u64 = 10_000_000;

// ===== PROCESS CONTROL =====

/// Seconds without traffic before the listener binary shuts down
/// (0 disables the timeout)
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;

/// Interval between status lines
pub const STATUS_INTERVAL_MS: u64 = 1_000;
