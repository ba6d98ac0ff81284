//! Captured market data
//!
//! - [`capture`]: fixed-record capture file format, reader and writer
//! - [`generator`]: seeded synthetic capture source

pub mod capture;
pub mod generator;

pub use capture::{load_validated, read_capture, write_capture, CaptureWriter, CapturedMessage};
pub use generator::{CaptureGenerator, GENERATOR_SYMBOLS};
