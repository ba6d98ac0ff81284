//! Core value types for the market-data pipeline
//!
//! - `Message`: one market event in a single 64-byte cache line
//! - `wire`: datagram encoding with explicit network byte order
//! - `errors`: typed errors for every component
//!
//! All message types are `Copy` with no heap data so they can be moved
//! through the ring buffer without allocation.

pub mod errors;
pub mod message;
pub mod wire;

pub use errors::{
    CaptureError, ConfigError, ConsumerError, ListenerError, MessageValidationError,
    ReplayError, WorkerError,
};
pub use message::{Message, MessageKind, Side, Symbol, SYMBOL_LEN};
pub use wire::WIRE_SIZE;
