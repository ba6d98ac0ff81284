//! Performance Utilities
//!
//! Low-level helpers for the pinned pipeline threads:
//! - **CPU affinity**: core assignment, platform capability, pinning
//! - **Lock-free counters**: cache-padded atomic statistics

pub mod cpu;
pub mod metrics;

pub use cpu::{
    allowed_cores, cpu_pause, num_cores, pin_to_core, set_realtime_priority, AffinityStrategy,
    CoreAssignment,
};
pub use metrics::{Counter, HighWaterMark};
