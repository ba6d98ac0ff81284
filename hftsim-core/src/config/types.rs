use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::{
    DEFAULT_CAPTURE_FILE, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_REPLAY_ADDR, DEFAULT_RING_CAPACITY,
    DEFAULT_SPEED_FACTOR, DEFAULT_UDP_PORT,
};

/// Main configuration structure
///
/// The core components never read this directly; binaries pull the
/// primitive values out and pass them to constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub listener: ListenerSettings,
    pub ring: RingSettings,
    pub consumer: ConsumerSettings,
    pub replay: ReplaySettings,

    /// Seconds without traffic before the listener shuts down (0 = never)
    pub idle_timeout_secs: u64,
}

/// Datagram listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Local UDP port to bind
    pub port: u16,

    /// CPU core for the receive thread (`null` = no pinning)
    pub core: Option<usize>,
}

/// Ring buffer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSettings {
    /// Slot count; power of two, one of the compiled-in sizes
    pub capacity: usize,
}

/// Ring consumer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerSettings {
    /// CPU core for the drain thread (`null` = no pinning)
    pub core: Option<usize>,
}

/// Replay driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Destination IP address or host name
    pub dest_addr: String,

    /// Destination UDP port
    pub dest_port: u16,

    /// 1.0 = recorded pace, 2.0 = twice as fast
    pub speed_factor: f64,

    /// CPU core for the send thread (`null` = no pinning)
    pub core: Option<usize>,

    /// Capture file to replay
    pub capture_file: PathBuf,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_UDP_PORT,
            core: None,
        }
    }
}

impl Default for RingSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            dest_addr: DEFAULT_REPLAY_ADDR.to_string(),
            dest_port: DEFAULT_UDP_PORT,
            speed_factor: DEFAULT_SPEED_FACTOR,
            core: None,
            capture_file: PathBuf::from(DEFAULT_CAPTURE_FILE),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            listener: ListenerSettings::default(),
            ring: RingSettings::default(),
            consumer: ConsumerSettings::default(),
            replay: ReplaySettings::default(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}
