pub mod constants;
pub mod types;

pub use types::*;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use crate::core::errors::ConfigError;
use constants::SUPPORTED_RING_CAPACITIES;

impl PipelineConfig {
    /// Load configuration from a JSON file and validate it
    ///
    /// Missing sections and fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        tracing::info!(path = %path.display(), "Loaded pipeline configuration");
        Ok(cfg)
    }

    /// Parse without validating
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ring_capacity(self.ring.capacity)?;

        if self.listener.port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        let speed = self.replay.speed_factor;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(speed));
        }

        self.replay_destination()?;
        Ok(())
    }

    /// Resolve the replay destination to a socket address
    pub fn replay_destination(&self) -> Result<SocketAddr, ConfigError> {
        let target = format!("{}:{}", self.replay.dest_addr, self.replay.dest_port);
        if self.replay.dest_addr.trim().is_empty() {
            return Err(ConfigError::InvalidDestination(target));
        }
        (self.replay.dest_addr.as_str(), self.replay.dest_port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or(ConfigError::InvalidDestination(target))
    }

    /// Idle timeout, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Check a ring capacity against the bitmask rule and the compiled-in sizes
pub fn validate_ring_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity < 2 || !capacity.is_power_of_two() {
        return Err(ConfigError::InvalidCapacity(capacity));
    }
    if !SUPPORTED_RING_CAPACITIES.contains(&capacity) {
        return Err(ConfigError::UnsupportedCapacity {
            capacity,
            supported: SUPPORTED_RING_CAPACITIES,
        });
    }
    Ok(())
}
