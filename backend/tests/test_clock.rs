//! Tests for SimulationClock
//!
//! Integer tick counters drive spawning, sampling and day rollover.

use intersection_control_core::core::clock::SimulationClock;
use intersection_control_core::core::constants::{DAILY_SAMPLES, SECONDS_PER_DAY, TICK_RATE};

const TICKS_PER_MINUTE: u64 = 60 * TICK_RATE as u64;

#[test]
fn test_clock_new() {
    let clock = SimulationClock::new(0.0);
    assert_eq!(clock.time_of_day_ticks(), 0);
    assert_eq!(clock.day(), 0);
    assert!(!clock.spawn_due());
}

#[test]
fn test_spawn_due_after_five_seconds() {
    let mut clock = SimulationClock::new(0.0);
    for _ in 0..49 {
        clock.advance_tick();
    }
    assert!(!clock.spawn_due());

    clock.advance_tick();
    assert!(clock.spawn_due());

    clock.mark_spawned();
    assert!(!clock.spawn_due());
}

#[test]
fn test_sample_every_minute() {
    let mut clock = SimulationClock::new(0.0);
    let mut samples = 0;
    for _ in 0..(10 * TICKS_PER_MINUTE) {
        if clock.advance_tick().sample_due {
            samples += 1;
        }
    }
    assert_eq!(samples, 10);
}

#[test]
fn test_day_rollover() {
    // One minute before midnight
    let mut clock = SimulationClock::new(SECONDS_PER_DAY - 60.0);

    let mut rollovers = 0;
    for _ in 0..TICKS_PER_MINUTE {
        if clock.advance_tick().day_rolled_over {
            rollovers += 1;
        }
    }

    assert_eq!(rollovers, 1);
    assert_eq!(clock.day(), 1);
    assert_eq!(clock.time_of_day_ticks(), 0);
    assert_eq!(clock.formatted(), "00:00:00");
}

#[test]
fn test_full_day_sample_count() {
    let mut clock = SimulationClock::new(0.0);
    let mut samples = 0;
    loop {
        let events = clock.advance_tick();
        if events.sample_due {
            samples += 1;
        }
        if events.day_rolled_over {
            break;
        }
    }
    assert_eq!(samples, DAILY_SAMPLES);
}
