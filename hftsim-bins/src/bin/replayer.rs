//! Capture replayer
//!
//! Loads a capture file, validates every record, and re-sends it over UDP
//! with the recorded spacing scaled by the speed factor.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hftsim_bins::common::{
    init_logging, install_shutdown_handler, load_config, setup_performance, sleep_unless_stopped,
    CommonArgs,
};
use hftsim_core::config::PipelineConfig;
use hftsim_core::net::UdpReplayer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a capture file over UDP")]
struct ReplayerArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Capture file to replay
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Destination address
    #[arg(long)]
    dest_addr: Option<String>,

    /// Destination UDP port
    #[arg(long)]
    dest_port: Option<u16>,

    /// 1.0 = recorded pace, 2.0 = twice as fast
    #[arg(long)]
    speed: Option<f64>,

    /// CPU core for the send thread
    #[arg(long)]
    replay_core: Option<usize>,
}

impl ReplayerArgs {
    fn apply_overrides(&self, cfg: &mut PipelineConfig) {
        if let Some(file) = &self.file {
            cfg.replay.capture_file = file.clone();
        }
        if let Some(addr) = &self.dest_addr {
            cfg.replay.dest_addr = addr.clone();
        }
        if let Some(port) = self.dest_port {
            cfg.replay.dest_port = port;
        }
        if let Some(speed) = self.speed {
            cfg.replay.speed_factor = speed;
        }
        if self.replay_core.is_some() {
            cfg.replay.core = self.replay_core;
        }
    }
}

fn main() -> Result<()> {
    let args = ReplayerArgs::parse();
    init_logging(&args.common)?;

    let mut cfg = load_config(&args.common)?;
    args.apply_overrides(&mut cfg);
    cfg.validate().context("invalid configuration")?;

    setup_performance(args.common.realtime)?;
    let token = install_shutdown_handler()?;

    let dest = cfg.replay_destination()?;
    tracing::info!("=== HftSim: Capture Replayer ===");

    let mut replayer = UdpReplayer::new(dest, cfg.replay.speed_factor, cfg.replay.core.into())?;
    let loaded = replayer
        .load_all_messages(&cfg.replay.capture_file)
        .with_context(|| format!("loading {}", cfg.replay.capture_file.display()))?;
    tracing::info!(
        file = %cfg.replay.capture_file.display(),
        messages = loaded,
        %dest,
        speed_factor = cfg.replay.speed_factor,
        "Capture loaded"
    );

    replayer.start()?;
    let stats = replayer.stats();

    while replayer.is_active() && sleep_unless_stopped(&token, Duration::from_millis(100)) {}
    replayer.stop();

    if let Some(reason) = replayer.failure() {
        anyhow::bail!("replay failed: {}", reason);
    }
    tracing::info!(
        sent = stats.sent(),
        total = stats.total(),
        finished = replayer.finished(),
        "Replay done"
    );
    Ok(())
}
