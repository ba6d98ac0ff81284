//! Market-data listener pipeline
//!
//! UDP listener (pinned) -> SPSC ring -> consumer (pinned) -> strategy
//!
//! Prints ring statistics every second and exits on Ctrl+C or after the
//! configured idle timeout.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use hftsim_bins::common::{
    init_logging, install_shutdown_handler, load_config, setup_performance, sleep_unless_stopped,
    CommonArgs,
};
use hftsim_core::config::constants::STATUS_INTERVAL_MS;
use hftsim_core::config::PipelineConfig;
use hftsim_core::core::Message;
use hftsim_core::engine::{RingBufferConsumer, StrategySink};
use hftsim_core::net::{push_or_drop, push_with_retry, UdpListener};
use hftsim_core::ring::SpscRingBuffer;
use hftsim_core::worker::StopToken;
use hftsim_core::Strategy;

#[derive(Parser, Debug)]
#[command(author, version, about = "UDP market-data listener with SPSC ring and strategy")]
struct ListenerArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// UDP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// CPU core for the receive thread
    #[arg(long)]
    listener_core: Option<usize>,

    /// CPU core for the consumer thread
    #[arg(long)]
    consumer_core: Option<usize>,

    /// Ring capacity (power of two, one of the compiled-in sizes)
    #[arg(long)]
    capacity: Option<usize>,

    /// Seconds without traffic before exiting (0 = never)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Strategy: symbol-counter, buy-sell, mean-reversion
    #[arg(short, long, default_value = "symbol-counter")]
    strategy: String,

    /// Spin until the ring accepts each message instead of dropping
    #[arg(long)]
    retry_push: bool,
}

impl ListenerArgs {
    fn apply_overrides(&self, cfg: &mut PipelineConfig) {
        if let Some(port) = self.port {
            cfg.listener.port = port;
        }
        if self.listener_core.is_some() {
            cfg.listener.core = self.listener_core;
        }
        if self.consumer_core.is_some() {
            cfg.consumer.core = self.consumer_core;
        }
        if let Some(capacity) = self.capacity {
            cfg.ring.capacity = capacity;
        }
        if let Some(secs) = self.idle_timeout_secs {
            cfg.idle_timeout_secs = secs;
        }
    }
}

fn main() -> Result<()> {
    let args = ListenerArgs::parse();
    init_logging(&args.common)?;

    let mut cfg = load_config(&args.common)?;
    args.apply_overrides(&mut cfg);
    cfg.validate().context("invalid configuration")?;

    setup_performance(args.common.realtime)?;
    let token = install_shutdown_handler()?;

    let Some(strategy) = hftsim_strategies::by_name(&args.strategy) else {
        bail!(
            "unknown strategy '{}' (expected one of {:?})",
            args.strategy,
            hftsim_strategies::STRATEGY_NAMES
        );
    };

    tracing::info!("=== HftSim: UDP Listener ===");
    tracing::info!(
        port = cfg.listener.port,
        capacity = cfg.ring.capacity,
        strategy = strategy.name(),
        "Pipeline configuration"
    );

    // Capacity is a const generic; dispatch to the compiled-in sizes
    match cfg.ring.capacity {
        1024 => run_pipeline::<1024>(&cfg, strategy, args.retry_push, token),
        2048 => run_pipeline::<2048>(&cfg, strategy, args.retry_push, token),
        4096 => run_pipeline::<4096>(&cfg, strategy, args.retry_push, token),
        8192 => run_pipeline::<8192>(&cfg, strategy, args.retry_push, token),
        16384 => run_pipeline::<16384>(&cfg, strategy, args.retry_push, token),
        65536 => run_pipeline::<65536>(&cfg, strategy, args.retry_push, token),
        other => bail!("ring capacity {} is not compiled in", other),
    }
}

fn run_pipeline<const N: usize>(
    cfg: &PipelineConfig,
    strategy: Box<dyn Strategy + Send>,
    retry_push: bool,
    token: StopToken,
) -> Result<()> {
    let (producer, ring) = SpscRingBuffer::<Message, N>::new().split();
    let ring_stats = producer.stats();

    // The consumer thread owns the strategy until it exits
    let (sink, pending) = StrategySink::new(strategy);
    let mut consumer = RingBufferConsumer::new(ring, sink.into_callback());
    consumer.start_with_token(cfg.consumer.core.into(), token.clone())?;

    let callback: Box<dyn FnMut(&Message) + Send> = if retry_push {
        Box::new(push_with_retry(producer, token.clone()))
    } else {
        Box::new(push_or_drop(producer))
    };
    let mut listener = UdpListener::new(cfg.listener.port, cfg.listener.core.into(), callback)?;
    listener.start()?;
    let listener_stats = listener.stats();

    let idle_timeout = cfg.idle_timeout();
    let mut last_forwarded = 0;
    let mut last_activity = Instant::now();

    while sleep_unless_stopped(&token, Duration::from_millis(STATUS_INTERVAL_MS)) {
        let ring = ring_stats.snapshot();
        let forwarded = listener_stats.forwarded();
        tracing::info!(
            received = listener_stats.received(),
            discarded = listener_stats.discarded(),
            pushed = ring.pushed,
            popped = ring.popped,
            dropped = ring.dropped,
            high_water_mark = ring.high_water_mark,
            "Status"
        );

        if forwarded != last_forwarded {
            last_forwarded = forwarded;
            last_activity = Instant::now();
        } else if let Some(timeout) = idle_timeout {
            if last_activity.elapsed() >= timeout {
                tracing::info!(?timeout, "No traffic, shutting down");
                break;
            }
        }

        if let Some(reason) = listener.failure().or_else(|| consumer.failure()) {
            tracing::error!(%reason, "Pipeline thread failed, shutting down");
            break;
        }
    }

    token.request_stop();
    listener.stop();
    consumer.stop();

    let ring = ring_stats.snapshot();
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Messages pushed: {}", ring.pushed);
    tracing::info!("Messages popped: {}", ring.popped);
    tracing::info!("Messages dropped: {}", ring.dropped);
    tracing::info!(
        "Ring high-water mark: {} ({:.1}% of capacity)",
        ring.high_water_mark,
        ring.peak_utilization() * 100.0
    );
    tracing::info!("Datagrams discarded: {}", listener_stats.discarded());

    drop(consumer);
    match pending.reclaim(Duration::from_secs(1)) {
        Some(strategy) => tracing::info!("{}: {}", strategy.name(), strategy.report()),
        None => tracing::warn!("Strategy was not returned by the consumer thread"),
    }

    Ok(())
}
