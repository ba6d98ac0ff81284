//! Synthetic capture generator
//!
//! Writes a deterministic capture of add orders over AAPL, MSFT, GOOG, AMZN
//! and TSLA for the replayer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hftsim_bins::common::{init_logging, load_config, CommonArgs};
use hftsim_core::config::constants::{DEFAULT_GENERATED_MESSAGES, DEFAULT_GENERATOR_GAP_NS};
use hftsim_core::data::generator::DEFAULT_SEED;
use hftsim_core::data::CaptureGenerator;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a synthetic capture file")]
struct GeneratorArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output file (defaults to the configured replay capture file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of messages
    #[arg(short = 'n', long, default_value_t = DEFAULT_GENERATED_MESSAGES)]
    count: usize,

    /// Nanoseconds between consecutive messages
    #[arg(long, default_value_t = DEFAULT_GENERATOR_GAP_NS)]
    gap_ns: u64,

    /// RNG seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = GeneratorArgs::parse();
    init_logging(&args.common)?;

    let cfg = load_config(&args.common)?;
    let output = args.output.unwrap_or(cfg.replay.capture_file);

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }

    let written = CaptureGenerator::new(args.seed)
        .with_gap_ns(args.gap_ns)
        .write_to(&output, args.count)?;

    tracing::info!(
        file = %output.display(),
        messages = written,
        seed = args.seed,
        "Generated capture"
    );
    Ok(())
}
