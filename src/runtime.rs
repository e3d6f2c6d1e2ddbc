//! Frame runtime: turns scheduler output into paced bus frames.
//!
//! Each tick of the frame timer produces one normalized position frame,
//! scales it onto the register plane and hands it to the active sink (real
//! bus or simulator) on a blocking worker. If the previous bus transaction
//! is still in flight the frame is skipped, never queued; stale positions
//! are worse than dropped ones.

use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Instant;

use crate::{
    animation::{build_animation, AnimationScheduler, AnimationSpec, Linear, SineWave},
    bus::BusConductor,
    config::{SculptureConfig, MAX_POSITION, NUM_CHANNELS, POSITION_MULTIPLIER},
};

/// Where scaled frames go. Exactly one sink is active per run.
pub trait FrameSink: Send {
    fn apply_frame(&mut self, positions: &[u16; NUM_CHANNELS], time_delta_ms: u16) -> Result<()>;
}

impl FrameSink for BusConductor {
    fn apply_frame(&mut self, positions: &[u16; NUM_CHANNELS], time_delta_ms: u16) -> Result<()> {
        self.send_positions(positions, time_delta_ms)
    }
}

/// Commands accepted by the runtime from the control server and the TUI.
#[derive(Debug)]
pub enum ControlCommand {
    Append(AnimationSpec),
    DeleteHead,
    /// One-shot frame of normalized positions, bypassing the scheduler.
    PushPositions(Vec<f64>),
    Pause,
    Resume,
    Shutdown,
}

/// Snapshot of runtime state shared with the TUI and control server.
#[derive(Debug, Default, Clone)]
pub struct StatusSnapshot {
    pub positions: Vec<f64>,
    pub queue: Vec<String>,
    pub frames_sent: u64,
    pub frames_skipped: u64,
    pub paused: bool,
}

pub type SharedStatus = Arc<Mutex<StatusSnapshot>>;

/// Scale a normalized frame onto the register plane: multiply, clamp to the
/// motor travel limit, pad unused trailing channels with zero.
pub fn scale_frame(normalized: &[f64]) -> [u16; NUM_CHANNELS] {
    let mut registers = [0u16; NUM_CHANNELS];
    for (register, value) in registers.iter_mut().zip(normalized) {
        let scaled = (value.clamp(0.0, 1.0) * POSITION_MULTIPLIER).round() as u32;
        *register = scaled.min(MAX_POSITION as u32) as u16;
    }
    registers
}

/// Queue the built-in show played when no external control is attached.
pub fn queue_default_show(scheduler: &mut AnimationScheduler, total_balls: usize) {
    let sine = SineWave::new(0.0, 1.0, 0.5, 2.0, total_balls);
    let linear = Linear::new(30.0, 0.7, 0.01, 0.6, total_balls);
    let group = crate::animation::AdditiveGroup::new(
        50.0,
        vec![
            Box::new(SineWave::new(0.0, 1.0, 0.5, 2.0, total_balls)),
            Box::new(Linear::new(0.0, 0.7, 0.01, 0.6, total_balls)),
        ],
        total_balls,
    );
    scheduler.append(Box::new(sine));
    scheduler.append(Box::new(linear));
    scheduler.append(Box::new(group));
}

pub struct Runtime {
    config: SculptureConfig,
    scheduler: AnimationScheduler,
    sink: Arc<Mutex<Box<dyn FrameSink>>>,
    status: SharedStatus,
    control_rx: flume::Receiver<ControlCommand>,
    busy: Arc<AtomicBool>,
    started: Instant,
    manual_frame: Option<Vec<f64>>,
    paused: bool,
}

impl Runtime {
    pub fn new(
        config: SculptureConfig,
        scheduler: AnimationScheduler,
        sink: Box<dyn FrameSink>,
        control_rx: flume::Receiver<ControlCommand>,
    ) -> Self {
        Self {
            config,
            scheduler,
            sink: Arc::new(Mutex::new(sink)),
            status: Arc::new(Mutex::new(StatusSnapshot::default())),
            control_rx,
            busy: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
            manual_frame: None,
            paused: false,
        }
    }

    /// Handle for the TUI/server to observe runtime state.
    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    /// Run the frame loop until a shutdown command arrives.
    pub async fn run(mut self) -> Result<()> {
        log::info!(
            "Frame loop starting: interval {}ms, sync delta {}ms",
            self.config.frame_interval_ms,
            self.config.sync_time_delta()
        );

        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(
            self.config.frame_interval_ms,
        ));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !self.drain_control_commands() {
                break;
            }

            self.publish_status();

            if self.paused {
                continue;
            }

            let elapsed = self.started.elapsed().as_secs_f64();
            self.dispatch_frame(elapsed);
        }

        log::info!("Frame loop exited cleanly");
        Ok(())
    }

    /// Produce and dispatch one frame, or skip it if the bus is busy.
    ///
    /// The busy gate comes first: a pending manual frame must survive a
    /// skipped tick, and the published positions must only ever show frames
    /// that were actually handed to the sink.
    fn dispatch_frame(&mut self, elapsed: f64) {
        // Only this loop sets the flag; the blocking worker clears it.
        if self.busy.load(Ordering::SeqCst) {
            log::warn!("Bus is busy, skipping this frame");
            self.status.lock().unwrap().frames_skipped += 1;
            return;
        }

        let frame = match self.manual_frame.take() {
            Some(manual) => Some(manual),
            None => self.scheduler.next_frame(elapsed),
        };
        let Some(frame) = frame else {
            return;
        };

        {
            let mut status = self.status.lock().unwrap();
            status.positions = frame.clone();
        }
        self.busy.store(true, Ordering::SeqCst);

        let registers = scale_frame(&frame);
        let time_delta = self.config.sync_time_delta();
        let sink = self.sink.clone();
        let busy = self.busy.clone();
        let status = self.status.clone();

        // Bus writes block on serial I/O and pacing sleeps; keep them
        // off the async executor.
        tokio::task::spawn_blocking(move || {
            let result = sink.lock().unwrap().apply_frame(&registers, time_delta);
            match result {
                Ok(()) => {
                    let mut status = status.lock().unwrap();
                    status.frames_sent += 1;
                    if status.frames_sent % 100 == 0 {
                        log::info!("Successful frames: {}", status.frames_sent);
                    }
                }
                Err(err) => log::warn!("Frame write failed: {err}"),
            }
            busy.store(false, Ordering::SeqCst);
        });
    }

    /// Apply pending control commands; returns false on shutdown.
    fn drain_control_commands(&mut self) -> bool {
        while let Ok(command) = self.control_rx.try_recv() {
            match command {
                ControlCommand::Append(spec) => {
                    let animation = build_animation(&spec, self.config.total_balls());
                    self.scheduler.append(animation);
                }
                ControlCommand::DeleteHead => self.scheduler.delete_head(),
                ControlCommand::PushPositions(positions) => {
                    self.manual_frame = Some(positions);
                }
                ControlCommand::Pause => {
                    log::info!("Frame loop paused");
                    self.paused = true;
                }
                ControlCommand::Resume => {
                    log::info!("Frame loop resumed");
                    self.paused = false;
                }
                ControlCommand::Shutdown => {
                    log::info!("Frame loop received shutdown command");
                    return false;
                }
            }
        }
        true
    }

    fn publish_status(&self) {
        let mut status = self.status.lock().unwrap();
        status.queue = self.scheduler.queue_details();
        status.paused = self.paused;
    }
}
