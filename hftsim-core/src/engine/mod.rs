//! Consumer side of the pipeline
//!
//! - `consumer`: pinned drain loop over the SPSC ring
//! - `sink`: lock-free strategy ownership for the drain loop
//! - `traits`: the `Strategy` interface fed by that loop

pub mod consumer;
pub mod sink;
pub mod traits;

pub use consumer::{ConsumerStats, RingBufferConsumer};
pub use sink::{StrategyReturn, StrategySink};
pub use traits::Strategy;
