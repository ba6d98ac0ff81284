//! HftSim Core - SPSC market-data pipeline
//!
//! A replay stage emits fixed-format market messages over UDP, a pinned
//! listener thread decodes them into a lock-free ring buffer, and a pinned
//! consumer thread drains the ring into a strategy callback.
//!
//! ```text
//! UdpReplayer ──UDP──> UdpListener ──push──> SpscRingBuffer ──pop──> RingBufferConsumer ──> Strategy
//! ```
//!
//! ## Architecture
//! - **Cache-line aligned** messages and ring cursors (64 bytes)
//! - **Lock-free** release/acquire handoff between exactly two threads
//! - **Const generic** ring capacity, checked at compile time
//! - **No allocation, no logging** on the hot path
//!
//! ## Core Modules
//! - `core`: message format, wire codec, error types
//! - `ring`: SPSC ring buffer and its producer/consumer handles
//! - `worker`: pinned threads, lifecycle, stop tokens
//! - `net`: UDP listener and replay driver
//! - `engine`: ring consumer and the `Strategy` trait
//! - `data`: capture files and the synthetic generator
//! - `config`: JSON configuration and compile-time constants

pub mod config;
pub mod core;
pub mod data;
pub mod engine;
pub mod net;
pub mod perf;
pub mod resilience;
pub mod ring;
pub mod testing;
pub mod utils;
pub mod worker;

pub use crate::core::{Message, MessageKind, Side, Symbol, WIRE_SIZE};
pub use config::PipelineConfig;
pub use engine::{RingBufferConsumer, Strategy};
pub use net::{UdpListener, UdpReplayer};
pub use ring::SpscRingBuffer;
pub use worker::{PinnedWorker, StopToken};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    // Message format
    pub use crate::core::{Message, MessageKind, Side, Symbol};

    // Pipeline components
    pub use crate::engine::{RingBufferConsumer, Strategy, StrategySink};
    pub use crate::net::{push_or_drop, push_with_retry, UdpListener, UdpReplayer};
    pub use crate::ring::{RingConsumer, RingProducer, SpscRingBuffer};
    pub use crate::worker::{LifecycleState, PinnedWorker, StopToken};

    // Performance utilities
    pub use crate::perf::{pin_to_core, CoreAssignment};

    // Error types
    pub use crate::{Error, Result};
}
