//! Ring-buffer consumer
//!
//! Drains a [`RingConsumer`] on its own pinned thread and invokes a
//! callback for every item. The loop has exactly two outcomes per
//! iteration: an item was handled, or the ring was empty and the thread
//! paused briefly.

use std::sync::Arc;

use tracing::info;

use crate::core::errors::ConsumerError;
use crate::perf::cpu::{cpu_pause, CoreAssignment};
use crate::perf::metrics::Counter;
use crate::ring::RingConsumer;
use crate::worker::{Lifecycle, LifecycleState, PinnedWorker, StopToken};

/// Consumer-side counters
#[derive(Debug, Default)]
pub struct ConsumerStats {
    processed: Counter,
}

impl ConsumerStats {
    /// Items handed to the callback
    pub fn processed(&self) -> u64 {
        self.processed.get()
    }
}

/// Single-shot drain loop over an SPSC ring
pub struct RingBufferConsumer<T, const N: usize, F>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    parts: Option<(RingConsumer<T, N>, F)>,
    lifecycle: Lifecycle,
    stats: Arc<ConsumerStats>,
    worker: Option<PinnedWorker>,
}

impl<T, const N: usize, F> RingBufferConsumer<T, N, F>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    pub fn new(ring: RingConsumer<T, N>, callback: F) -> Self {
        Self {
            parts: Some((ring, callback)),
            lifecycle: Lifecycle::new(),
            stats: Arc::new(ConsumerStats::default()),
            worker: None,
        }
    }

    /// Launch the drain thread on `core`
    pub fn start(&mut self, core: CoreAssignment) -> Result<(), ConsumerError> {
        self.start_with_token(core, StopToken::new())
    }

    /// Launch the drain thread, observing an externally owned stop token
    pub fn start_with_token(
        &mut self,
        core: CoreAssignment,
        token: StopToken,
    ) -> Result<(), ConsumerError> {
        if let Err(state) = self
            .lifecycle
            .transition(LifecycleState::Idle, LifecycleState::Running)
        {
            return Err(ConsumerError::InvalidState(state));
        }

        let Some((mut ring, mut callback)) = self.parts.take() else {
            self.lifecycle.set(LifecycleState::Stopped);
            return Err(ConsumerError::InvalidState(LifecycleState::Stopped));
        };
        let stats = Arc::clone(&self.stats);

        let spawned = PinnedWorker::spawn_with_token("consumer", core, token, move |stop| {
            while !stop.is_stop_requested() {
                match ring.try_pop() {
                    Some(item) => {
                        callback(&item);
                        stats.processed.inc();
                    }
                    None => cpu_pause(),
                }
            }
            Ok(())
        });

        match spawned {
            Ok(worker) => {
                info!(?core, capacity = N, "Ring consumer started");
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.lifecycle.set(LifecycleState::Stopped);
                Err(e.into())
            }
        }
    }

    /// Signal the drain loop and join it
    ///
    /// Items still in the ring are left there and dropped with it.
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
        info!(processed = self.stats.processed(), "Ring consumer stopped");
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Failure recorded by the drain thread (e.g. a callback panic)
    pub fn failure(&self) -> Option<String> {
        self.worker.as_ref().and_then(PinnedWorker::failure)
    }
}

impl<T, const N: usize, F> Drop for RingBufferConsumer<T, N, F>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}
