//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use hftsim_core::config::PipelineConfig;
use hftsim_core::worker::StopToken;

/// Common CLI arguments for all binaries
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Enable real-time priority (requires privileges)
    #[arg(long)]
    pub realtime: bool,
}

/// Initialize tracing/logging and the panic hook
pub fn init_logging(args: &CommonArgs) -> Result<()> {
    hftsim_core::utils::init_logger(&args.log_level, args.json_logs)?;
    hftsim_core::resilience::install_panic_handler();
    Ok(())
}

/// Load the configuration file, or defaults when none was given
///
/// The result is not validated yet; apply CLI overrides first.
pub fn load_config(args: &CommonArgs) -> Result<PipelineConfig> {
    match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Set real-time priority on the main thread
///
/// Worker threads spawned afterwards inherit the scheduling policy.
pub fn setup_performance(realtime: bool) -> Result<()> {
    if realtime {
        hftsim_core::perf::cpu::set_realtime_priority(50)?;
    }
    Ok(())
}

/// Route Ctrl+C to a stop token
pub fn install_shutdown_handler() -> Result<StopToken> {
    let token = StopToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("Received shutdown signal");
        handler_token.request_stop();
    })
    .context("installing Ctrl-C handler")?;
    Ok(token)
}

/// Sleep up to `total`, waking early on stop; false if stop was requested
pub fn sleep_unless_stopped(token: &StopToken, total: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(50);
    let mut remaining = total;
    while !remaining.is_zero() {
        if token.is_stop_requested() {
            return false;
        }
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
    !token.is_stop_requested()
}
