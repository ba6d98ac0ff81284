//! Capture replay over UDP
//!
//! Loads a whole capture up front, then re-sends each message at
//! `replay_start + (ts - first_ts) / speed_factor`, reproducing the
//! recorded spacing scaled by the speed factor.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, info};

use crate::config::constants::MAX_REPLAY_SLEEP_NS;
use crate::core::errors::ReplayError;
use crate::core::wire;
use crate::data::capture::{load_validated, CapturedMessage};
use crate::perf::cpu::CoreAssignment;
use crate::perf::metrics::Counter;
use crate::worker::{Lifecycle, LifecycleState, PinnedWorker, StopToken};

/// Send-side counters, readable from any thread
#[derive(Debug, Default)]
pub struct ReplayStats {
    total: AtomicUsize,
    sent: Counter,
    send_errors: Counter,
}

impl ReplayStats {
    /// Messages scheduled for this replay
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Messages transmitted so far
    pub fn sent(&self) -> u64 {
        self.sent.get()
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors.get()
    }
}

/// Single-shot replay driver
pub struct UdpReplayer {
    dest: SocketAddr,
    speed_factor: f64,
    core: CoreAssignment,
    messages: Vec<CapturedMessage>,
    lifecycle: Lifecycle,
    stats: Arc<ReplayStats>,
    worker: Option<PinnedWorker>,
}

impl UdpReplayer {
    /// Create an idle replayer
    ///
    /// `speed_factor` must be finite and strictly positive: 1.0 keeps the
    /// recorded pace, 2.0 halves every gap, 0.5 doubles it.
    pub fn new(
        dest: SocketAddr,
        speed_factor: f64,
        core: CoreAssignment,
    ) -> Result<Self, ReplayError> {
        if !speed_factor.is_finite() || speed_factor <= 0.0 {
            return Err(ReplayError::InvalidSpeed(speed_factor));
        }
        let core = core.validate()?;
        Ok(Self {
            dest,
            speed_factor,
            core,
            messages: Vec::new(),
            lifecycle: Lifecycle::new(),
            stats: Arc::new(ReplayStats::default()),
            worker: None,
        })
    }

    /// Use an in-memory capture instead of a file
    pub fn with_messages(mut self, messages: Vec<CapturedMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Load and validate an entire capture file
    ///
    /// Any invalid record fails the load and leaves no messages loaded.
    /// Only an idle replayer accepts a capture.
    pub fn load_all_messages<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, ReplayError> {
        let state = self.lifecycle.get();
        if state != LifecycleState::Idle {
            return Err(ReplayError::InvalidState(state));
        }
        self.messages.clear();
        self.messages = load_validated(path)?;
        Ok(self.messages.len())
    }

    /// Messages waiting to be replayed (empty once started)
    pub fn messages(&self) -> &[CapturedMessage] {
        &self.messages
    }

    /// Open the sender socket and launch the replay thread
    pub fn start(&mut self) -> Result<(), ReplayError> {
        if let Err(state) = self
            .lifecycle
            .transition(LifecycleState::Idle, LifecycleState::Running)
        {
            return Err(ReplayError::InvalidState(state));
        }

        match self.launch() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.lifecycle.set(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    fn launch(&mut self) -> Result<(), ReplayError> {
        let bind_addr: SocketAddr = if self.dest.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).map_err(|source| ReplayError::Socket {
            dest: self.dest,
            source,
        })?;

        let messages = std::mem::take(&mut self.messages);
        self.stats.total.store(messages.len(), Ordering::Relaxed);

        let dest = self.dest;
        let speed = self.speed_factor;
        let stats = Arc::clone(&self.stats);
        let worker = PinnedWorker::spawn("replay", self.core, move |stop| {
            replay_loop(&socket, dest, &messages, speed, &stats, stop)
        })?;

        info!(
            %dest,
            speed_factor = speed,
            messages = self.stats.total(),
            "Replay started"
        );
        self.worker = Some(worker);
        Ok(())
    }

    /// True once every loaded message has been sent
    pub fn finished(&self) -> bool {
        self.lifecycle.get() != LifecycleState::Idle
            && self.stats.sent() as usize == self.stats.total()
    }

    /// True while the replay thread is still sending
    ///
    /// Goes false on completion, on `stop()`, or if sending failed.
    pub fn is_active(&self) -> bool {
        self.lifecycle.get() == LifecycleState::Running
            && self.worker.as_ref().map_or(false, |w| !w.is_finished())
    }

    /// Abort the replay early and join the thread
    ///
    /// Idempotent. Before `start()` it does nothing.
    pub fn stop(&mut self) {
        if self
            .lifecycle
            .transition(LifecycleState::Running, LifecycleState::Stopping)
            .is_err()
        {
            return;
        }
        if let Some(worker) = self.worker.as_mut() {
            worker.stop();
        }
        self.lifecycle.set(LifecycleState::Stopped);
        info!(
            sent = self.stats.sent(),
            total = self.stats.total(),
            "Replay stopped"
        );
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    pub fn stats(&self) -> Arc<ReplayStats> {
        Arc::clone(&self.stats)
    }

    /// Failure recorded by the replay thread, if sending failed
    pub fn failure(&self) -> Option<String> {
        self.worker.as_ref().and_then(PinnedWorker::failure)
    }
}

impl Drop for UdpReplayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Delay of a message relative to replay start
pub fn send_offset(first_ts_ns: u64, ts_ns: u64, speed_factor: f64) -> Duration {
    let recorded = ts_ns.saturating_sub(first_ts_ns) as f64;
    Duration::from_nanos((recorded / speed_factor) as u64)
}

fn replay_loop(
    socket: &UdpSocket,
    dest: SocketAddr,
    messages: &[CapturedMessage],
    speed_factor: f64,
    stats: &ReplayStats,
    stop: &StopToken,
) -> anyhow::Result<()> {
    let Some(first_ts) = messages.first().map(|m| m.timestamp_ns) else {
        debug!("Nothing to replay");
        return Ok(());
    };
    let replay_start = Instant::now();

    for record in messages {
        let target = replay_start + send_offset(first_ts, record.timestamp_ns, speed_factor);
        if !sleep_until(target, stop) {
            debug!(sent = stats.sent(), "Replay interrupted");
            return Ok(());
        }

        let payload = wire::encode(&record.message);
        if let Err(e) = socket.send_to(&payload, dest) {
            stats.send_errors.inc();
            return Err(e).with_context(|| {
                format!("send of sequence {} to {} failed", record.message.sequence, dest)
            });
        }
        stats.sent.inc();
    }

    info!(sent = stats.sent(), "Replay complete");
    Ok(())
}

/// Sleep in bounded slices until `target`; false if stop was requested
fn sleep_until(target: Instant, stop: &StopToken) -> bool {
    let max_slice = Duration::from_nanos(MAX_REPLAY_SLEEP_NS);
    loop {
        if stop.is_stop_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= target {
            return true;
        }
        std::thread::sleep((target - now).min(max_slice));
    }
}
