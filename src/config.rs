//! Sculpture topology constants and runtime configuration.
//!
//! The hardware layout is fixed: 31 motor-driver units on one RS-485 bus,
//! 4 motors per unit, addressed as 124 consecutive holding registers. The
//! runtime knobs (device path, frame rate, simulation flag) come from an
//! optional TOML file overridden by CLI flags.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of motor-driver units on the bus, station ids 1..=31.
pub const NUM_UNITS: u8 = 31;

/// Motors (position registers) per driver unit.
pub const MOTORS_PER_UNIT: u16 = 4;

/// Total position register channels (31 units x 4 motors).
pub const NUM_CHANNELS: usize = NUM_UNITS as usize * MOTORS_PER_UNIT as usize;

/// First holding register of the position plane.
pub const POSITION_START_ADDR: u16 = 100;

/// Broadcast register that triggers coordinated motion on all units.
pub const SYNC_REG_ADDR: u16 = 99;

/// Station id used for broadcast writes.
pub const BROADCAST_STATION: u8 = 0;

/// Normalized animation values are scaled by this factor before hitting
/// the register plane.
pub const POSITION_MULTIPLIER: f64 = 12000.0;

/// Register values are clamped to this ceiling (motor travel limit).
pub const MAX_POSITION: u16 = 11_000;

/// Pacing gap between per-unit register writes, in microseconds.
pub const WRITE_GAP_US: u64 = 2_000;

/// Settle gap around the broadcast sync write, in microseconds.
pub const SYNC_SETTLE_US: u64 = 2_500;

/// Response timeout for addressed (non-broadcast) requests.
pub const RESPONSE_TIMEOUT_MS: u64 = 800;

/// Coil writes get a longer confirmation window.
pub const COIL_RESPONSE_TIMEOUT_MS: u64 = 221;

/// Extra milliseconds added to the sync time-delta so units finish their
/// ramps slightly after the next frame lands.
pub const SPEED_BUFFER_MS: u16 = 10;

fn default_port_name() -> String {
    #[cfg(target_os = "macos")]
    {
        "/dev/tty.usbserial-AC0134TM".to_string()
    }
    #[cfg(not(target_os = "macos"))]
    {
        "/dev/ttyUSB0".to_string()
    }
}

fn default_baud_rate() -> u32 {
    460_800
}

fn default_frame_interval_ms() -> u64 {
    280
}

fn default_balls_per_ring() -> Vec<usize> {
    vec![50, 41, 32]
}

fn default_server_port() -> u16 {
    8765
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SculptureConfig {
    /// Serial device path
    #[serde(default = "default_port_name")]
    pub port_name: String,
    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Frame timer interval in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Run against the in-memory simulator instead of the bus
    #[serde(default)]
    pub simulate: bool,
    /// Ball count per ring, innermost first
    #[serde(default = "default_balls_per_ring")]
    pub balls_per_ring: Vec<usize>,
    /// Port for the JSON control server
    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Default for SculptureConfig {
    fn default() -> Self {
        Self {
            port_name: default_port_name(),
            baud_rate: default_baud_rate(),
            frame_interval_ms: default_frame_interval_ms(),
            simulate: false,
            balls_per_ring: default_balls_per_ring(),
            server_port: default_server_port(),
        }
    }
}

impl SculptureConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            anyhow!(
                "Failed to read config file {}: {err}",
                path.as_ref().display()
            )
        })?;
        Self::from_toml(&content)
    }

    /// Total balls across all rings.
    pub fn total_balls(&self) -> usize {
        self.balls_per_ring.iter().sum()
    }

    fn validate(&self) -> Result<()> {
        if self.balls_per_ring.is_empty() {
            return Err(anyhow!("balls_per_ring must not be empty"));
        }
        if self.total_balls() > NUM_CHANNELS {
            return Err(anyhow!(
                "Ring layout needs {} channels but the register plane only has {}",
                self.total_balls(),
                NUM_CHANNELS
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(anyhow!("frame_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// The value carried by the broadcast sync register: the frame interval
    /// plus a small buffer, saturated to the register width.
    pub fn sync_time_delta(&self) -> u16 {
        u16::try_from(self.frame_interval_ms)
            .unwrap_or(u16::MAX)
            .saturating_add(SPEED_BUFFER_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_the_register_plane() {
        let config = SculptureConfig::default();
        assert_eq!(config.total_balls(), 123);
        assert!(config.total_balls() <= NUM_CHANNELS);
        assert_eq!(config.sync_time_delta(), 290);
    }

    #[test]
    fn test_toml_overrides_and_defaults() {
        let config = SculptureConfig::from_toml(
            r#"
            port_name = "/dev/ttyUSB1"
            frame_interval_ms = 100
            simulate = true
            "#,
        )
        .unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB1");
        assert_eq!(config.frame_interval_ms, 100);
        assert!(config.simulate);
        // unspecified fields fall back to defaults
        assert_eq!(config.baud_rate, 460_800);
        assert_eq!(config.balls_per_ring, vec![50, 41, 32]);
    }

    #[test]
    fn test_oversized_ring_layout_rejected() {
        let result = SculptureConfig::from_toml("balls_per_ring = [100, 100]");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let config = SculptureConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SculptureConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.port_name, config.port_name);
        assert_eq!(parsed.frame_interval_ms, config.frame_interval_ms);
    }
}
