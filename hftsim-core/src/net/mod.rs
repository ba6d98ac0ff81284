//! Datagram transport
//!
//! - `listener`: UDP receive loop feeding a callback (producer side)
//! - `replay`: paced re-transmission of a capture

pub mod listener;
pub mod replay;

pub use listener::{push_or_drop, push_with_retry, ListenerStats, UdpListener};
pub use replay::{send_offset, ReplayStats, UdpReplayer};
