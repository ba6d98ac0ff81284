//! UDP market-data listener (the producer side of the pipeline)
//!
//! Binds a non-blocking datagram socket, decodes every datagram of exactly
//! [`WIRE_SIZE`] bytes and hands the host-order [`Message`] to a callback,
//! usually one that pushes into the ring buffer. Everything else on the
//! port is counted and dropped.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use crossbeam_utils::Backoff;
use tracing::{debug, info, warn};

use crate::config::constants::RECV_BUFFER_SIZE;
use crate::core::errors::ListenerError;
use crate::core::message::Message;
use crate::core::wire::{self, WIRE_SIZE};
use crate::perf::cpu::{cpu_pause, CoreAssignment};
use crate::perf::metrics::Counter;
use crate::ring::RingProducer;
use crate::worker::{Lifecycle, LifecycleState, PinnedWorker, StopToken};

/// Receive-side counters, readable from any thread
#[derive(Debug, Default)]
pub struct ListenerStats {
    received: Counter,
    discarded: Counter,
    forwarded: Counter,
    recv_errors: Counter,
}

impl ListenerStats {
    /// Datagrams read from the socket
    pub fn received(&self) -> u64 {
        self.received.get()
    }

    /// Datagrams dropped for having the wrong size
    pub fn discarded(&self) -> u64 {
        self.discarded.get()
    }

    /// Messages handed to the callback
    pub fn forwarded(&self) -> u64 {
        self.forwarded.get()
    }

    /// Socket errors other than "no data yet"
    pub fn recv_errors(&self) -> u64 {
        self.recv_errors.get()
    }
}

/// Single-shot UDP listener
///
/// `Idle -> Running -> Stopping -> Stopped`. A stopped listener cannot be
/// restarted; build a new one.
pub struct UdpListener<F>
where
    F: FnMut(&Message) + Send + 'static,
{
    port: u16,
    core: CoreAssignment,
    callback: Option<F>,
    lifecycle: Lifecycle,
    stats: Arc<ListenerStats>,
    local_addr: Option<SocketAddr>,
    worker: Option<PinnedWorker>,
}

impl<F> UdpListener<F>
where
    F: FnMut(&Message) + Send + 'static,
{
    /// Create an idle listener
    ///
    /// The core index is checked here so a bad assignment fails before any
    /// socket is opened.
    pub fn new(port: u16, core: CoreAssignment, callback: F) -> Result<Self, ListenerError> {
        let core = core.validate()?;
        Ok(Self {
            port,
            core,
            callback: Some(callback),
            lifecycle: Lifecycle::new(),
            stats: Arc::new(ListenerStats::default()),
            local_addr: None,
            worker: None,
        })
    }

    /// Bind the socket and launch the receive thread
    ///
    /// Bind and socket errors are returned before any thread exists. Calling
    /// this twice fails with [`ListenerError::InvalidState`].
    pub fn start(&mut self) -> Result<(), ListenerError> {
        if let Err(state) = self
            .lifecycle
            .transition(LifecycleState::Idle, LifecycleState::Running)
        {
            return Err(ListenerError::InvalidState(state));
        }

        match self.launch() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.lifecycle.set(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    fn launch(&mut self) -> Result<(), ListenerError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.port)).map_err(|source| {
            ListenerError::Bind {
                port: self.port,
                source,
            }
        })?;
        socket
            .set_nonblocking(true)
            .map_err(ListenerError::Socket)?;
        let local_addr = socket.local_addr().map_err(ListenerError::Socket)?;

        let Some(mut callback) = self.callback.take() else {
            return Err(ListenerError::InvalidState(self.lifecycle.get()));
        };
        let stats = Arc::clone(&self.stats);

        let worker = PinnedWorker::spawn("listener", self.core, move |stop| {
            receive_loop(&socket, &stats, &mut callback, stop)
        })?;

        info!(%local_addr, core = ?self.core, "UDP listener started");
        self.local_addr = Some(local_addr);
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop the receive thread and release the socket
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
            received = self.stats.received(),
            forwarded = self.stats.forwarded(),
            discarded = self.stats.discarded(),
            "UDP listener stopped"
        );
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    /// Bound address, available once started
    ///
    /// Useful when the listener was created with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Shared handle to the receive counters
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Failure recorded by the receive thread, if it died
    pub fn failure(&self) -> Option<String> {
        self.worker.as_ref().and_then(PinnedWorker::failure)
    }
}

impl<F> Drop for UdpListener<F>
where
    F: FnMut(&Message) + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop<F>(
    socket: &UdpSocket,
    stats: &ListenerStats,
    callback: &mut F,
    stop: &StopToken,
) -> anyhow::Result<()>
where
    F: FnMut(&Message),
{
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    let backoff = Backoff::new();

    while !stop.is_stop_requested() {
        match socket.recv(&mut buf) {
            Ok(len) => {
                backoff.reset();
                stats.received.inc();
                // Only exact-size payloads are messages
                match wire::decode(&buf[..len]) {
                    Some(mut msg) => {
                        // One logical symbol, one key downstream
                        msg.symbol = msg.symbol.normalized();
                        callback(&msg);
                        stats.forwarded.inc();
                    }
                    None => stats.discarded.inc(),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => backoff.snooze(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                stats.recv_errors.inc();
                debug!("UDP receive error: {}", e);
                backoff.snooze();
            }
        }
    }

    debug!(expected_len = WIRE_SIZE, "Receive loop exiting");
    Ok(())
}

/// Listener callback that pushes into the ring and drops on overflow
///
/// Overflow is recorded by the ring's own dropped counter.
pub fn push_or_drop<const N: usize>(
    mut producer: RingProducer<Message, N>,
) -> impl FnMut(&Message) + Send + 'static {
    move |msg: &Message| {
        let _ = producer.try_push(*msg);
    }
}

/// Listener callback that spins until the ring accepts the message
///
/// Gives up only when `stop` is requested, so shutdown never hangs on a
/// stalled consumer. Every rejected attempt still counts as a drop in the
/// ring statistics.
pub fn push_with_retry<const N: usize>(
    mut producer: RingProducer<Message, N>,
    stop: StopToken,
) -> impl FnMut(&Message) + Send + 'static {
    move |msg: &Message| {
        let mut pending = *msg;
        loop {
            match producer.try_push(pending) {
                Ok(()) => return,
                Err(rejected) => {
                    if stop.is_stop_requested() {
                        warn!(sequence = rejected.sequence, "Ring full at shutdown, message lost");
                        return;
                    }
                    pending = rejected;
                    cpu_pause();
                }
            }
        }
    }
}
