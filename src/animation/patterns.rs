use super::Animation;

/// Sine wave whose spatial frequency itself oscillates between a minimum
/// and maximum over time, producing a slow breathing effect across the
/// rings.
pub struct SineWave {
    start_time: f64,
    max_amplitude: f64,
    min_frequency: f64,
    max_frequency: f64,
    positions: Vec<f64>,
}

impl SineWave {
    pub fn new(
        start_time: f64,
        max_amplitude: f64,
        min_frequency: f64,
        max_frequency: f64,
        total_balls: usize,
    ) -> Self {
        Self {
            start_time,
            max_amplitude,
            min_frequency,
            max_frequency,
            positions: vec![0.0; total_balls],
        }
    }
}

impl Animation for SineWave {
    fn name(&self) -> &'static str {
        "sine wave"
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn update_positions(&mut self, elapsed: f64) {
        let frequency_range = (self.max_frequency - self.min_frequency) / 2.0;
        let frequency_offset = (self.max_frequency + self.min_frequency) / 2.0;
        let current_frequency = frequency_range * elapsed.sin() + frequency_offset;

        let amplitude = self.max_amplitude;
        for (i, position) in self.positions.iter_mut().enumerate() {
            let angle = (i as f64 * current_frequency).to_radians();
            // shift the -amp..amp wave into 0..1
            *position = (angle.sin() * amplitude + amplitude) / (2.0 * amplitude);
        }
    }

    fn positions(&self) -> &[f64] {
        &self.positions
    }

    fn describe(&self) -> String {
        format!(
            "sine_wave(start={}, amp={}, freq={}..{})",
            self.start_time, self.max_amplitude, self.min_frequency, self.max_frequency
        )
    }
}

/// Travelling ramp across the array: a linear gradient that scrolls at the
/// configured speed, bounded to min..max.
pub struct Linear {
    start_time: f64,
    speed: f64,
    min_value: f64,
    max_value: f64,
    positions: Vec<f64>,
}

impl Linear {
    pub fn new(
        start_time: f64,
        speed: f64,
        min_value: f64,
        max_value: f64,
        total_balls: usize,
    ) -> Self {
        Self {
            start_time,
            speed,
            min_value,
            max_value,
            positions: vec![0.0; total_balls],
        }
    }
}

impl Animation for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn update_positions(&mut self, elapsed: f64) {
        let total = self.positions.len().max(1) as f64;
        let phase = elapsed * self.speed;
        let span = self.max_value - self.min_value;
        for (i, position) in self.positions.iter_mut().enumerate() {
            let ramp = (i as f64 / total + phase).fract();
            *position = self.min_value + span * ramp;
        }
    }

    fn positions(&self) -> &[f64] {
        &self.positions
    }

    fn describe(&self) -> String {
        format!(
            "linear(start={}, speed={}, range={}..{})",
            self.start_time, self.speed, self.min_value, self.max_value
        )
    }
}

/// Element-wise sum of member animations, renormalized by the frame maximum
/// so combined values stay inside 0..=1.
pub struct AdditiveGroup {
    start_time: f64,
    animations: Vec<Box<dyn Animation>>,
    positions: Vec<f64>,
}

impl AdditiveGroup {
    pub fn new(start_time: f64, animations: Vec<Box<dyn Animation>>, total_balls: usize) -> Self {
        Self {
            start_time,
            animations,
            positions: vec![0.0; total_balls],
        }
    }
}

impl Animation for AdditiveGroup {
    fn name(&self) -> &'static str {
        "group"
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn update_positions(&mut self, elapsed: f64) {
        self.positions.iter_mut().for_each(|p| *p = 0.0);

        for animation in &mut self.animations {
            animation.update_positions(elapsed);
            for (sum, value) in self.positions.iter_mut().zip(animation.positions()) {
                *sum += value;
            }
        }

        let max_position = self.positions.iter().cloned().fold(0.0f64, f64::max);
        if max_position > 0.0 {
            for position in &mut self.positions {
                *position /= max_position;
            }
        }
    }

    fn positions(&self) -> &[f64] {
        &self.positions
    }

    fn describe(&self) -> String {
        let members: Vec<String> = self
            .animations
            .iter()
            .map(|animation| animation.describe())
            .collect();
        format!("group(start={}, [{}])", self.start_time, members.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_stays_normalized() {
        let mut wave = SineWave::new(0.0, 1.0, 0.5, 2.0, 123);
        for step in 0..20 {
            wave.update_positions(step as f64 * 0.28);
            assert!(wave
                .positions()
                .iter()
                .all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_linear_respects_bounds() {
        let mut ramp = Linear::new(0.0, 0.7, 0.01, 0.6, 50);
        ramp.update_positions(3.5);
        for &v in ramp.positions() {
            assert!(v >= 0.01 - 1e-9 && v <= 0.6 + 1e-9);
        }
    }

    #[test]
    fn test_linear_ramp_scrolls_over_time() {
        let mut ramp = Linear::new(0.0, 1.0, 0.0, 1.0, 10);
        ramp.update_positions(0.0);
        let before = ramp.positions()[0];
        ramp.update_positions(0.25);
        let after = ramp.positions()[0];
        assert!((before - after).abs() > 1e-6);
    }

    #[test]
    fn test_group_normalizes_to_unit_range() {
        let members: Vec<Box<dyn Animation>> = vec![
            Box::new(SineWave::new(0.0, 1.0, 0.5, 2.0, 16)),
            Box::new(Linear::new(0.0, 0.7, 0.0, 1.0, 16)),
        ];
        let mut group = AdditiveGroup::new(0.0, members, 16);
        group.update_positions(1.0);
        let max = group.positions().iter().cloned().fold(0.0f64, f64::max);
        assert!(max <= 1.0 + 1e-9);
        assert!(max > 0.0);
    }
}
