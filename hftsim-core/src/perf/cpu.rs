//! CPU Affinity and Thread Priority Utilities
//!
//! Pinning each pipeline thread to its own core keeps its cache warm and
//! removes scheduler migration jitter. Pinning is an optimisation, not a
//! correctness requirement: where it is unavailable the thread still runs.

use anyhow::Result;
use core_affinity::CoreId;

use crate::core::errors::WorkerError;

/// Which core a worker thread should run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreAssignment {
    /// Leave scheduling to the OS
    #[default]
    Unpinned,
    /// Bind to this core index
    Core(usize),
}

impl CoreAssignment {
    /// Reject cores this process may not run on
    pub fn validate(self) -> Result<Self, WorkerError> {
        self.validate_against(&allowed_cores())
    }

    /// Check against an explicit set of permitted core ids
    ///
    /// Ids need not be contiguous: under a restricted cpuset the permitted
    /// set can be e.g. `[2, 3]`.
    pub fn validate_against(self, allowed: &[usize]) -> Result<Self, WorkerError> {
        match self {
            Self::Core(core) if !allowed.contains(&core) => Err(WorkerError::InvalidCore {
                core,
                allowed: allowed.to_vec(),
            }),
            _ => Ok(self),
        }
    }
}

impl From<Option<usize>> for CoreAssignment {
    fn from(core: Option<usize>) -> Self {
        core.map_or(Self::Unpinned, Self::Core)
    }
}

/// How this platform honours a core request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffinityStrategy {
    /// Hard per-core affinity (Linux, Windows, FreeBSD)
    PinToCore,
    /// No per-core API; raise the thread's QoS class instead (macOS)
    QosHint,
    /// Nothing available
    NoOp,
}

impl AffinityStrategy {
    /// Capability of the platform this binary was built for
    pub const fn detect() -> Self {
        if cfg!(any(
            target_os = "linux",
            target_os = "android",
            target_os = "windows",
            target_os = "freebsd"
        )) {
            Self::PinToCore
        } else if cfg!(target_os = "macos") {
            Self::QosHint
        } else {
            Self::NoOp
        }
    }

    /// Apply `assignment` to the calling thread
    ///
    /// Failures are returned for the caller to log; they are never fatal.
    pub fn apply(self, assignment: CoreAssignment) -> Result<()> {
        let CoreAssignment::Core(core) = assignment else {
            return Ok(());
        };
        match self {
            Self::PinToCore => pin_to_core(core),
            Self::QosHint => raise_qos_class(),
            Self::NoOp => Ok(()),
        }
    }
}

/// Pin the current thread to a specific CPU core
///
/// # Example
/// ```no_run
/// use hftsim_core::perf::cpu::pin_to_core;
/// pin_to_core(2).expect("Failed to pin to core 2");
/// ```
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };

    if core_affinity::set_for_current(core_id) {
        tracing::debug!("Pinned thread to CPU core {}", core);
        Ok(())
    } else {
        anyhow::bail!("Failed to pin thread to core {}", core)
    }
}

#[cfg(target_os = "macos")]
fn raise_qos_class() -> Result<()> {
    // SAFETY: only changes the scheduling class of the calling thread.
    let rc = unsafe {
        libc::pthread_set_qos_class_self_np(libc::qos_class_t::QOS_CLASS_USER_INTERACTIVE, 0)
    };
    if rc == 0 {
        tracing::debug!("Raised thread QoS class to user-interactive");
        Ok(())
    } else {
        anyhow::bail!("pthread_set_qos_class_self_np failed with {}", rc)
    }
}

#[cfg(not(target_os = "macos"))]
fn raise_qos_class() -> Result<()> {
    Ok(())
}

/// Set real-time thread priority (Linux only)
///
/// Requires CAP_SYS_NICE capability or root privileges.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    let param = sched_param {
        sched_priority: priority,
    };

    // SAFETY: pid 0 targets the calling thread; `param` outlives the call.
    if unsafe { sched_setscheduler(0, SCHED_FIFO, &param) } == 0 {
        tracing::info!("Set thread priority to SCHED_FIFO:{}", priority);
        Ok(())
    } else {
        anyhow::bail!("Failed to set thread priority (may need CAP_SYS_NICE or root)")
    }
}

/// Set real-time thread priority (non-Linux platforms)
///
/// On non-Linux platforms, this is a no-op with a warning.
#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    tracing::warn!("Real-time priority setting not supported on this platform");
    Ok(())
}

/// Core ids this process may be scheduled on, ascending
///
/// On Linux this is the affinity mask, which is not necessarily `0..n`.
pub fn allowed_cores() -> Vec<usize> {
    let mut ids: Vec<usize> = core_affinity::get_core_ids()
        .map(|ids| ids.into_iter().map(|c| c.id).collect())
        .unwrap_or_default();
    if ids.is_empty() {
        let n = std::thread::available_parallelism().map_or(1, |n| n.get());
        ids = (0..n).collect();
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Get the number of available CPU cores
pub fn num_cores() -> usize {
    allowed_cores().len()
}

/// Spin-loop hint for busy-wait retries
///
/// Emits `pause` on x86 and `yield`/`isb` on ARM, easing pressure on a
/// hyper-threaded sibling.
#[inline(always)]
pub fn cpu_pause() {
    std::hint::spin_loop();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_cores() {
        let cores = num_cores();
        assert!(cores > 0);
    }

    #[test]
    fn test_core_assignment_validation() {
        let allowed = allowed_cores();
        assert!(CoreAssignment::Unpinned.validate().is_ok());
        assert!(CoreAssignment::Core(allowed[0]).validate().is_ok());

        let too_big = allowed[allowed.len() - 1] + 10;
        match CoreAssignment::Core(too_big).validate() {
            Err(WorkerError::InvalidCore { core, allowed: reported }) => {
                assert_eq!(core, too_big);
                assert_eq!(reported, allowed);
            }
            other => panic!("expected InvalidCore, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_uses_core_ids_not_count() {
        // e.g. `taskset -c 2,3`
        let allowed = [2, 3];
        assert_eq!(
            CoreAssignment::Core(3).validate_against(&allowed).unwrap(),
            CoreAssignment::Core(3)
        );
        assert!(CoreAssignment::Core(2).validate_against(&allowed).is_ok());
        for core in [0, 1, 4] {
            assert!(matches!(
                CoreAssignment::Core(core).validate_against(&allowed),
                Err(WorkerError::InvalidCore { core: c, .. }) if c == core
            ));
        }
        assert!(CoreAssignment::Unpinned.validate_against(&[]).is_ok());
    }

    #[test]
    fn test_allowed_cores_sorted_and_unique() {
        let ids = allowed_cores();
        assert!(!ids.is_empty());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.len(), num_cores());
    }

    #[test]
    fn test_core_assignment_from_option() {
        assert_eq!(CoreAssignment::from(None), CoreAssignment::Unpinned);
        assert_eq!(CoreAssignment::from(Some(3)), CoreAssignment::Core(3));
    }

    #[test]
    fn test_unpinned_apply_is_noop() {
        for strategy in [
            AffinityStrategy::PinToCore,
            AffinityStrategy::QosHint,
            AffinityStrategy::NoOp,
        ] {
            assert!(strategy.apply(CoreAssignment::Unpinned).is_ok());
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_pins() {
        assert_eq!(AffinityStrategy::detect(), AffinityStrategy::PinToCore);
    }

    #[test]
    fn test_pin_to_core() {
        // May fail in restricted containers; must not panic either way
        let core = allowed_cores()[0];
        let result = std::thread::spawn(move || pin_to_core(core)).join().unwrap();
        if let Err(e) = result {
            println!("CPU pinning not available: {:?}", e);
        }
    }
}
