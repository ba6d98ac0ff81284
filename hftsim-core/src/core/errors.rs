//! Domain-specific error types for the market-data pipeline
//!
//! Each component surfaces its own error enum so callers can tell a
//! contract violation (bad core index, double start) apart from an OS
//! failure (bind, spawn) or a data-integrity failure (corrupt capture).
//!
//! Transient conditions (ring full/empty, no datagram yet) are *not*
//! errors and never appear here.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::worker::LifecycleState;

/// Reasons a single message fails validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageValidationError {
    /// Logical symbol name is empty (first byte NUL)
    #[error("symbol is empty")]
    EmptySymbol,

    /// Bytes after the symbol's first NUL must also be NUL
    #[error("symbol {symbol:?} has non-zero bytes after its terminator")]
    DirtySymbolPadding { symbol: [u8; 8] },

    /// Quantity must be strictly positive
    #[error("size must be positive (got {size})")]
    ZeroSize { size: u32 },

    /// Price must be finite and strictly positive
    #[error("price must be positive and finite (got {price})")]
    InvalidPrice { price: f64 },
}

/// Errors from spawning or pinning a worker thread
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Requested core is not in this process's affinity set
    #[error("invalid CPU core {core}: allowed cores are {allowed:?}")]
    InvalidCore { core: usize, allowed: Vec<usize> },

    /// The OS refused to create the thread
    #[error("failed to spawn worker thread '{name}'")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Errors from the datagram listener
#[derive(Debug, Error)]
pub enum ListenerError {
    /// `start()` called outside the Idle state
    #[error("listener cannot start from state {0:?}")]
    InvalidState(LifecycleState),

    /// Socket could not be bound to the configured port
    #[error("failed to bind UDP socket on port {port}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Socket option (non-blocking mode) could not be applied
    #[error("failed to configure UDP socket")]
    Socket(#[source] io::Error),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Errors from the ring-buffer consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// `start()` called outside the Idle state
    #[error("consumer cannot start from state {0:?}")]
    InvalidState(LifecycleState),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Errors from reading or writing capture files
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error on capture file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File length is not a whole number of records
    #[error("capture file is {len} bytes, not a multiple of the {record_size}-byte record")]
    Truncated { len: u64, record_size: usize },

    /// A record failed field validation
    #[error("capture record {index} is invalid: {reason}")]
    InvalidRecord {
        index: usize,
        #[source]
        reason: MessageValidationError,
    },
}

/// Errors from the replay driver
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Speed factor must be finite and > 0
    #[error("invalid replay speed factor {0} (must be finite and > 0)")]
    InvalidSpeed(f64),

    /// `start()` called outside the Idle state
    #[error("replayer cannot start from state {0:?}")]
    InvalidState(LifecycleState),

    /// Sender socket could not be created or connected
    #[error("failed to open UDP sender towards {dest}")]
    Socket {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Errors from loading or validating the pipeline configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ring capacity {0} must be a power of two and at least 2")]
    InvalidCapacity(usize),

    #[error("ring capacity {capacity} is not compiled in (supported: {supported:?})")]
    UnsupportedCapacity {
        capacity: usize,
        supported: &'static [usize],
    },

    #[error("invalid replay speed factor {0} (must be finite and > 0)")]
    InvalidSpeed(f64),

    #[error("listener port must be non-zero")]
    ZeroPort,

    #[error("invalid replay destination '{0}'")]
    InvalidDestination(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_error_display() {
        let err = WorkerError::InvalidCore {
            core: 99,
            allowed: vec![2, 3],
        };
        let msg = err.to_string();
        assert!(msg.contains("99"));
        assert!(msg.contains("[2, 3]"));
    }

    #[test]
    fn test_capture_error_wraps_validation() {
        let err = CaptureError::InvalidRecord {
            index: 3,
            reason: MessageValidationError::ZeroSize { size: 0 },
        };
        assert!(err.to_string().contains("record 3"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_listener_error_from_worker() {
        let err: ListenerError = WorkerError::InvalidCore {
            core: 4,
            allowed: vec![0, 1],
        }
        .into();
        assert!(matches!(err, ListenerError::Worker(_)));
    }
}
