//! In-memory sculpture model used in simulation mode and by tests.
//!
//! Receives the same scaled register frames as the hardware and tracks the
//! resulting ball heights per ring, so animations can be exercised without
//! an RS-485 adapter attached.

use anyhow::{anyhow, Result};

use crate::{
    config::NUM_CHANNELS,
    runtime::FrameSink,
};

/// Millimetres of ball travel per motor step (5 mm pitch, 180:1 reduction
/// over the full 11000-step travel).
pub const STEP_SIZE_MM: f64 = (5.0 * 180.0) / 11_000.0;

pub struct SimulatedSculpture {
    balls_per_ring: Vec<usize>,
    /// Ball heights in millimetres below the start position, per ring.
    rings: Vec<Vec<f64>>,
    frames_applied: u64,
    last_time_delta: u16,
}

impl SimulatedSculpture {
    pub fn new(balls_per_ring: &[usize]) -> Result<Self> {
        let total: usize = balls_per_ring.iter().sum();
        if total > NUM_CHANNELS {
            return Err(anyhow!(
                "Ring layout needs {total} channels but only {NUM_CHANNELS} exist"
            ));
        }
        Ok(Self {
            balls_per_ring: balls_per_ring.to_vec(),
            rings: balls_per_ring.iter().map(|&n| vec![0.0; n]).collect(),
            frames_applied: 0,
            last_time_delta: 0,
        })
    }

    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    pub fn last_time_delta(&self) -> u16 {
        self.last_time_delta
    }

    /// Heights of one ring in millimetres.
    pub fn ring(&self, index: usize) -> Option<&[f64]> {
        self.rings.get(index).map(Vec::as_slice)
    }
}

impl FrameSink for SimulatedSculpture {
    fn apply_frame(&mut self, positions: &[u16; NUM_CHANNELS], time_delta_ms: u16) -> Result<()> {
        let mut channel = 0usize;
        for ring in &mut self.rings {
            for height in ring.iter_mut() {
                *height = positions[channel] as f64 * STEP_SIZE_MM;
                channel += 1;
            }
        }

        self.frames_applied += 1;
        self.last_time_delta = time_delta_ms;
        log::debug!(
            "Simulated frame {} applied ({} rings, sync delta {time_delta_ms}ms)",
            self.frames_applied,
            self.balls_per_ring.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_maps_channels_to_rings() {
        let mut sculpture = SimulatedSculpture::new(&[2, 3]).unwrap();
        let mut positions = [0u16; NUM_CHANNELS];
        positions[0] = 11_000;
        positions[2] = 5_500;

        sculpture.apply_frame(&positions, 290).unwrap();

        let inner = sculpture.ring(0).unwrap();
        let outer = sculpture.ring(1).unwrap();
        assert!((inner[0] - 11_000.0 * STEP_SIZE_MM).abs() < 1e-9);
        assert_eq!(inner[1], 0.0);
        assert!((outer[0] - 5_500.0 * STEP_SIZE_MM).abs() < 1e-9);
        assert_eq!(sculpture.frames_applied(), 1);
        assert_eq!(sculpture.last_time_delta(), 290);
    }

    #[test]
    fn test_oversized_layout_rejected() {
        assert!(SimulatedSculpture::new(&[200]).is_err());
    }
}
