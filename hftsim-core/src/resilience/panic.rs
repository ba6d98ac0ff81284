//! Global panic hook
//!
//! Routes panic location and message through `tracing` before the default
//! hook runs. The hook never exits the process: pinned workers catch
//! panics at their thread boundary and keep the rest of the pipeline alive.
//!
//! # Usage
//!
//! Call `install_panic_handler()` early in main():
//!
//! ```no_run
//! use hftsim_core::resilience::install_panic_handler;
//!
//! fn main() {
//!     install_panic_handler();
//!     // ... rest of application
//! }
//! ```

use std::panic;
use tracing::error;

/// Install a global panic hook that logs through tracing
///
/// Replaces any previously installed hook but still delegates to the
/// default one (backtrace on `RUST_BACKTRACE=1`).
pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "<unknown location>".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "<no message>".to_string()
        };

        let thread = std::thread::current();
        error!(
            thread = thread.name().unwrap_or("<unnamed>"),
            location = %location,
            message = %message,
            "PANIC"
        );

        default_hook(panic_info);
    }));

    tracing::debug!("Panic handler installed");
}
