//! Testing utilities for unit and integration tests
//!
//! Provides test helpers for:
//! - Message and capture builders
//! - Deadline polling for threaded components
//! - Performance assertion utilities

pub mod helpers;

pub use helpers::*;
