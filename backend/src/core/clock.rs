//! Simulated time of day
//!
//! The simulation advances in fixed ticks of `1 / TICK_RATE` seconds. Time of
//! day wraps at 24h and bumps the day counter. All bookkeeping is done on
//! integer tick counters so repeated runs stay bit-identical.

use crate::core::constants::{
    secs_to_ticks, ticks_to_secs, SAMPLE_INTERVAL_SECS, SECONDS_PER_DAY, SPAWN_INTERVAL_SECS,
};
use serde::{Deserialize, Serialize};

/// What happened while advancing the clock by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockEvents {
    /// A statistics sample should be recorded for the current day
    pub sample_due: bool,
    /// Time of day wrapped past midnight
    pub day_rolled_over: bool,
}

/// Tracks time of day, day count and the periodic spawn/sample timers
///
/// # Example
/// ```
/// use intersection_control_core::SimulationClock;
///
/// let mut clock = SimulationClock::new(8.0 * 3600.0); // 08:00
/// assert_eq!(clock.day(), 0);
///
/// clock.advance_tick();
/// assert!((clock.time_of_day_secs() - 28800.1).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Ticks since midnight
    time_of_day_ticks: u64,
    ticks_per_day: u64,
    /// Days completed since the run started
    day: usize,
    ticks_since_spawn: u64,
    ticks_since_sample: u64,
    spawn_interval_ticks: u64,
    sample_interval_ticks: u64,
}

impl SimulationClock {
    /// Create a clock starting at `start_time_secs` past midnight
    ///
    /// # Panics
    /// Panics if the start time is outside `[0, 86400)`.
    pub fn new(start_time_secs: f64) -> Self {
        assert!(
            (0.0..SECONDS_PER_DAY).contains(&start_time_secs),
            "start time must be within one day"
        );
        Self {
            time_of_day_ticks: secs_to_ticks(start_time_secs),
            ticks_per_day: secs_to_ticks(SECONDS_PER_DAY),
            day: 0,
            ticks_since_spawn: 0,
            ticks_since_sample: 0,
            spawn_interval_ticks: secs_to_ticks(SPAWN_INTERVAL_SECS),
            sample_interval_ticks: secs_to_ticks(SAMPLE_INTERVAL_SECS),
        }
    }

    /// Advance by one tick, reporting sample and rollover boundaries
    pub fn advance_tick(&mut self) -> ClockEvents {
        let mut events = ClockEvents::default();

        self.time_of_day_ticks += 1;
        self.ticks_since_spawn += 1;
        self.ticks_since_sample += 1;

        if self.ticks_since_sample >= self.sample_interval_ticks {
            self.ticks_since_sample -= self.sample_interval_ticks;
            events.sample_due = true;
        }

        if self.time_of_day_ticks >= self.ticks_per_day {
            self.time_of_day_ticks -= self.ticks_per_day;
            self.ticks_since_sample = 0;
            self.day += 1;
            events.day_rolled_over = true;
        }

        events
    }

    /// True once a full spawn interval has passed since the last draw
    pub fn spawn_due(&self) -> bool {
        self.ticks_since_spawn >= self.spawn_interval_ticks
    }

    /// Restart the spawn interval
    pub fn mark_spawned(&mut self) {
        self.ticks_since_spawn = 0;
    }

    /// Seconds past midnight
    pub fn time_of_day_secs(&self) -> f64 {
        ticks_to_secs(self.time_of_day_ticks)
    }

    /// Ticks past midnight
    pub fn time_of_day_ticks(&self) -> u64 {
        self.time_of_day_ticks
    }

    /// Days completed (0 during the first simulated day)
    pub fn day(&self) -> usize {
        self.day
    }

    /// `HH:MM:SS` rendering of the time of day
    pub fn formatted(&self) -> String {
        let secs = self.time_of_day_secs() as u64;
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "start time must be within one day")]
    fn test_start_past_midnight_panics() {
        SimulationClock::new(SECONDS_PER_DAY);
    }

    #[test]
    fn test_formatted() {
        let clock = SimulationClock::new(8.0 * 3600.0 + 61.0);
        assert_eq!(clock.formatted(), "08:01:01");
    }
}
