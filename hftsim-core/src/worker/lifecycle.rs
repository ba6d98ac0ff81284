//! Worker lifecycle state and cooperative stop signalling
//!
//! Every pipeline component moves through the same single-shot sequence:
//!
//! ```text
//! Idle ──start()──> Running ──stop()──> Stopping ──joined──> Stopped
//! ```
//!
//! There is no path back to Idle; a stopped component is discarded.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle state of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, not started
    Idle = 0,
    /// Worker thread is executing
    Running = 1,
    /// Stop requested, join in progress
    Stopping = 2,
    /// Worker thread joined
    Stopped = 3,
}

impl From<u8> for LifecycleState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Atomic holder for a [`LifecycleState`]
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Idle as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `from -> to`, or return the state actually found
    pub fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), LifecycleState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(LifecycleState::from)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared cooperative stop flag
///
/// Clones observe the same flag. Worker loops poll
/// [`is_stop_requested`](Self::is_stop_requested) once per iteration.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop
    #[inline]
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
