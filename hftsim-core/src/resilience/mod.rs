//! Process-level resilience
//!
//! Panics are logged through tracing and contained at worker thread
//! boundaries; nothing here ever terminates the process.

pub mod panic;

pub use panic::install_panic_handler;
