//! Animation engine for the sculpture.
//!
//! Animations produce one normalized 0.0..=1.0 value per ball each frame.
//! The scheduler plays them from a FIFO queue: an animation starts once its
//! start time has elapsed and yields the stage to the next entry when it
//! reports completion.

mod patterns;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub use patterns::{AdditiveGroup, Linear, SineWave};

/// A source of per-ball positions. `elapsed` is seconds since program start.
pub trait Animation: Send {
    fn name(&self) -> &'static str;

    /// Seconds after program start at which this animation begins playing.
    fn start_time(&self) -> f64;

    /// Recompute the position buffer for the given elapsed time.
    fn update_positions(&mut self, elapsed: f64);

    fn positions(&self) -> &[f64];

    /// Animations run until deleted unless they override this.
    fn is_complete(&self, _elapsed: f64) -> bool {
        false
    }

    /// One-line parameter summary for the queue views.
    fn describe(&self) -> String;
}

struct Queued {
    animation: Box<dyn Animation>,
    playing: bool,
}

/// FIFO queue of animations with start-time gating.
pub struct AnimationScheduler {
    queue: VecDeque<Queued>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn append(&mut self, animation: Box<dyn Animation>) {
        log::debug!("Queued animation {}", animation.name());
        self.queue.push_back(Queued {
            animation,
            playing: false,
        });
    }

    /// Drop the head of the queue (current animation).
    pub fn delete_head(&mut self) {
        if let Some(entry) = self.queue.pop_front() {
            log::info!("Deleted animation {} from queue", entry.animation.name());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Parameter summaries in queue order, current animation first.
    pub fn queue_details(&self) -> Vec<String> {
        self.queue
            .iter()
            .map(|entry| entry.animation.describe())
            .collect()
    }

    /// Advance to the frame at `elapsed` seconds and return its positions,
    /// or None while the queue is empty or the head has not started yet.
    pub fn next_frame(&mut self, elapsed: f64) -> Option<Vec<f64>> {
        loop {
            let entry = self.queue.front_mut()?;

            if !entry.playing {
                if elapsed < entry.animation.start_time() {
                    return None;
                }
                entry.playing = true;
                log::info!("Animation {} started", entry.animation.name());
            }

            if entry.animation.is_complete(elapsed) {
                self.delete_head();
                continue;
            }

            entry.animation.update_positions(elapsed);
            return Some(entry.animation.positions().to_vec());
        }
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire format for animations submitted through the control server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationSpec {
    SineWave {
        #[serde(default)]
        starttime: f64,
        max_amplitude: f64,
        min_frequency: f64,
        max_frequency: f64,
    },
    Linear {
        #[serde(default)]
        starttime: f64,
        speed: f64,
        min_value: f64,
        max_value: f64,
    },
    GroupAdditive {
        #[serde(default)]
        starttime: f64,
        animations: Vec<AnimationSpec>,
    },
}

/// Instantiate an animation from its wire description.
pub fn build_animation(spec: &AnimationSpec, total_balls: usize) -> Box<dyn Animation> {
    match spec {
        AnimationSpec::SineWave {
            starttime,
            max_amplitude,
            min_frequency,
            max_frequency,
        } => Box::new(SineWave::new(
            *starttime,
            *max_amplitude,
            *min_frequency,
            *max_frequency,
            total_balls,
        )),
        AnimationSpec::Linear {
            starttime,
            speed,
            min_value,
            max_value,
        } => Box::new(Linear::new(
            *starttime,
            *speed,
            *min_value,
            *max_value,
            total_balls,
        )),
        AnimationSpec::GroupAdditive {
            starttime,
            animations,
        } => {
            let members = animations
                .iter()
                .map(|member| build_animation(member, total_balls))
                .collect();
            Box::new(AdditiveGroup::new(*starttime, members, total_balls))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_gates_on_start_time() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.append(Box::new(SineWave::new(5.0, 1.0, 0.5, 2.0, 10)));

        assert!(scheduler.next_frame(1.0).is_none());
        let frame = scheduler.next_frame(6.0).unwrap();
        assert_eq!(frame.len(), 10);
        assert!(frame.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_delete_head_promotes_next() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.append(Box::new(SineWave::new(0.0, 1.0, 0.5, 2.0, 4)));
        scheduler.append(Box::new(Linear::new(0.0, 0.7, 0.0, 0.6, 4)));
        assert_eq!(scheduler.queue_details().len(), 2);

        scheduler.delete_head();
        let details = scheduler.queue_details();
        assert_eq!(details.len(), 1);
        assert!(details[0].starts_with("linear"));
        assert!(scheduler.next_frame(1.0).is_some());
    }

    #[test]
    fn test_spec_round_trip_builds_group() {
        let json = r#"{
            "type": "group_additive",
            "starttime": 2.0,
            "animations": [
                {"type": "sine_wave", "max_amplitude": 1.0, "min_frequency": 0.5, "max_frequency": 2.0},
                {"type": "linear", "speed": 0.7, "min_value": 0.0, "max_value": 0.6}
            ]
        }"#;
        let spec: AnimationSpec = serde_json::from_str(json).unwrap();
        let animation = build_animation(&spec, 8);
        assert_eq!(animation.name(), "group");
        assert_eq!(animation.start_time(), 2.0);
    }
}
