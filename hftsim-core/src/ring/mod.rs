//! Lock-free SPSC transport between the listener and the consumer
//!
//! The ring buffer is the only mutable structure shared across threads in
//! the pipeline. Overflow and underflow are ordinary outcomes, never errors:
//! a full ring rejects the push (counted as a drop) and an empty ring
//! returns `None`.

pub mod spsc;

pub use spsc::{RingConsumer, RingProducer, RingSnapshot, RingStats, SpscRingBuffer};
