// End-to-end frame pipeline: scheduler output scaled onto the register
// plane, sliced into per-unit batches, and applied to the simulator.

use marionette::{
    animation::{AnimationScheduler, Linear, SineWave},
    bus::position_batches,
    config::{SculptureConfig, MAX_POSITION, NUM_CHANNELS, POSITION_START_ADDR},
    runtime::{queue_default_show, scale_frame, FrameSink},
    sim::SimulatedSculpture,
};

#[test]
fn scheduler_frame_reaches_all_units_in_order() {
    let config = SculptureConfig::default();
    let mut scheduler = AnimationScheduler::new();
    scheduler.append(Box::new(SineWave::new(
        0.0,
        1.0,
        0.5,
        2.0,
        config.total_balls(),
    )));

    let frame = scheduler.next_frame(1.0).expect("animation has started");
    assert_eq!(frame.len(), 123);

    let registers = scale_frame(&frame);
    assert!(registers.iter().all(|&r| r <= MAX_POSITION));
    // 123 balls leave the last channel of the last unit padded
    assert_eq!(registers[NUM_CHANNELS - 1], 0);

    let batches: Vec<_> = position_batches(&registers).collect();
    assert_eq!(batches.len(), 31);
    for (i, (addr, batch)) in batches.iter().enumerate() {
        assert_eq!(*addr, POSITION_START_ADDR + i as u16 * 4);
        assert_eq!(batch.len(), 4);
    }
}

#[test]
fn simulator_consumes_default_show() {
    let config = SculptureConfig::default();
    let mut scheduler = AnimationScheduler::new();
    queue_default_show(&mut scheduler, config.total_balls());

    let mut sculpture = SimulatedSculpture::new(&config.balls_per_ring).unwrap();
    let time_delta = config.sync_time_delta();

    for step in 0..10 {
        let elapsed = step as f64 * 0.28;
        if let Some(frame) = scheduler.next_frame(elapsed) {
            let registers = scale_frame(&frame);
            sculpture.apply_frame(&registers, time_delta).unwrap();
        }
    }

    assert_eq!(sculpture.frames_applied(), 10);
    assert_eq!(sculpture.last_time_delta(), 290);
    // the inner ring holds 50 balls and they moved off the floor
    let inner = sculpture.ring(0).unwrap();
    assert_eq!(inner.len(), 50);
    assert!(inner.iter().any(|&h| h > 0.0));
}

#[test]
fn manual_positions_frame_scales_like_scheduler_output() {
    let positions = vec![0.0, 0.5, 1.0];
    let registers = scale_frame(&positions);
    assert_eq!(registers[0], 0);
    assert_eq!(registers[1], 6000);
    assert_eq!(registers[2], MAX_POSITION);
}

#[test]
fn linear_ramp_survives_the_whole_pipeline() {
    let mut scheduler = AnimationScheduler::new();
    scheduler.append(Box::new(Linear::new(0.0, 0.7, 0.01, 0.6, 123)));

    let frame = scheduler.next_frame(3.0).unwrap();
    let registers = scale_frame(&frame);
    // bounds 0.01..0.6 map inside the register plane
    for &r in registers.iter().take(123) {
        assert!(r >= 120 && r <= 7200, "register {r} out of expected range");
    }
}
