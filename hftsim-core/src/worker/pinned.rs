//! Pinned worker thread
//!
//! Owns exactly one OS thread. The thread applies core affinity, runs the
//! supplied body until it returns, and records any error or panic instead of
//! letting it escape. Dropping the worker stops and joins it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::lifecycle::StopToken;
use crate::core::errors::WorkerError;
use crate::perf::cpu::{AffinityStrategy, CoreAssignment};

/// A named OS thread, optionally bound to a CPU core
///
/// Not `Clone`: the worker uniquely owns its thread. Moving it transfers
/// ownership of the join handle.
pub struct PinnedWorker {
    name: String,
    core: CoreAssignment,
    token: StopToken,
    handle: Option<JoinHandle<()>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl PinnedWorker {
    /// Spawn a worker with its own stop token
    ///
    /// The body receives the token and must poll
    /// [`StopToken::is_stop_requested`] to know when to return.
    pub fn spawn<F>(name: &str, core: CoreAssignment, body: F) -> Result<Self, WorkerError>
    where
        F: FnOnce(&StopToken) -> anyhow::Result<()> + Send + 'static,
    {
        Self::spawn_with_token(name, core, StopToken::new(), body)
    }

    /// Spawn a worker that observes an externally owned stop token
    ///
    /// Fails with [`WorkerError::InvalidCore`] before any thread is created
    /// if `core` does not exist on this machine.
    pub fn spawn_with_token<F>(
        name: &str,
        core: CoreAssignment,
        token: StopToken,
        body: F,
    ) -> Result<Self, WorkerError>
    where
        F: FnOnce(&StopToken) -> anyhow::Result<()> + Send + 'static,
    {
        let core = core.validate()?;
        let thread_name = format!("hftsim-{}", name);
        let failure = Arc::new(Mutex::new(None));

        let thread_token = token.clone();
        let thread_failure = Arc::clone(&failure);
        let role = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                if let Err(e) = AffinityStrategy::detect().apply(core) {
                    warn!(worker = %role, ?core, "CPU affinity not applied: {:#}", e);
                }

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&thread_token)));
                let reason = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(format!("{:#}", e)),
                    Err(payload) => Some(format!("panicked: {}", panic_message(&*payload))),
                };

                if let Some(reason) = reason {
                    error!(worker = %role, %reason, "Worker body failed");
                    *thread_failure.lock() = Some(reason);
                } else {
                    debug!(worker = %role, "Worker body returned");
                }
            })
            .map_err(|source| WorkerError::Spawn {
                name: thread_name,
                source,
            })?;

        info!(worker = name, ?core, "Worker started");

        Ok(Self {
            name: name.to_string(),
            core,
            token,
            handle: Some(handle),
            failure,
        })
    }

    /// Request stop and block until the thread has exited
    ///
    /// Safe to call any number of times; only the first call joins.
    pub fn stop(&mut self) {
        self.token.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                // Body panics are caught inside the thread; this only fires
                // if the logging around them panicked too
                error!(worker = %self.name, "Worker thread panicked outside its body");
            }
            info!(worker = %self.name, "Worker stopped");
        }
    }

    /// Whether the thread has exited (or was already joined)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Error or panic message recorded by the body, if any
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    pub fn token(&self) -> &StopToken {
        &self.token
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core(&self) -> CoreAssignment {
        self.core
    }
}

impl Drop for PinnedWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PinnedWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedWorker")
            .field("name", &self.name)
            .field("core", &self.core)
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<no message>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    #[test]
    fn test_runs_until_stopped() {
        let iterations = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&iterations);

        let mut worker = PinnedWorker::spawn("test-loop", CoreAssignment::Unpinned, move |stop| {
            while !stop.is_stop_requested() {
                counter.fetch_add(1, Ordering::Relaxed);
                thread::yield_now();
            }
            Ok(())
        })
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(!worker.is_finished());

        worker.stop();
        assert!(worker.is_finished());
        assert!(iterations.load(Ordering::Relaxed) > 0);
        assert!(worker.failure().is_none());
    }

    #[test]
    fn test_error_is_recorded() {
        let mut worker = PinnedWorker::spawn("test-err", CoreAssignment::Unpinned, |_| {
            anyhow::bail!("socket went away")
        })
        .unwrap();

        worker.stop();
        let failure = worker.failure().unwrap();
        assert!(failure.contains("socket went away"));
    }

    #[test]
    fn test_thread_is_named() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut worker = PinnedWorker::spawn("naming", CoreAssignment::Unpinned, move |_| {
            let _ = tx.send(thread::current().name().map(str::to_string));
            Ok(())
        })
        .unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some("hftsim-naming"));
        worker.stop();
    }

    #[test]
    fn test_move_transfers_ownership() {
        let worker = PinnedWorker::spawn("test-move", CoreAssignment::Unpinned, |stop| {
            while !stop.is_stop_requested() {
                thread::yield_now();
            }
            Ok(())
        })
        .unwrap();

        let mut moved = worker;
        moved.stop();
        assert!(moved.is_finished());
    }
}
