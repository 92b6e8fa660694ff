//! Controller-in-the-loop driver
//!
//! Each decision epoch the controller observes the junction, picks a command,
//! and the engine runs the epoch's ticks. Headless runs go as fast as the CPU
//! allows; paced runs sleep so simulated time tracks wall time scaled by
//! `time_scale`, and hand snapshots to an observer at most ten times per
//! wall-clock second.

use crate::core::constants::TICK_RATE;
use crate::orchestrator::engine::{Intersection, SimulationError};
use crate::orchestrator::snapshot::IntersectionSnapshot;
use crate::orchestrator::stats::{DayStatistics, RunSummary};
use crate::policy::SignalController;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Receives frames during paced runs
pub trait FrameObserver {
    fn on_frame(&mut self, snapshot: &IntersectionSnapshot);
}

/// Wall-clock pacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    /// Simulated seconds per wall second
    pub time_scale: f64,

    /// Minimum wall time between frames
    pub frame_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            frame_interval: Duration::from_millis(100),
        }
    }
}

impl Pacing {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "time_scale must be finite and positive, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }
}

struct PaceState {
    origin: Instant,
    ticks: u64,
    last_frame: Option<Instant>,
}

pub struct Runner {
    intersection: Intersection,
    controller: Box<dyn SignalController>,
    pacing: Option<Pacing>,
    observer: Option<Box<dyn FrameObserver>>,
    pace_state: Option<PaceState>,
    epochs: u64,
}

impl Runner {
    /// Headless runner
    pub fn new(intersection: Intersection, controller: Box<dyn SignalController>) -> Self {
        Self {
            intersection,
            controller,
            pacing: None,
            observer: None,
            pace_state: None,
            epochs: 0,
        }
    }

    /// Pace the run against the wall clock; rejects a non-positive scale
    pub fn with_pacing(mut self, pacing: Pacing) -> Result<Self, SimulationError> {
        pacing.validate()?;
        self.pacing = Some(pacing);
        Ok(self)
    }

    pub fn with_observer(mut self, observer: Box<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    pub fn epochs(&self) -> u64 {
        self.epochs
    }

    /// Run one decision epoch
    pub fn run_epoch(&mut self) -> Result<(), SimulationError> {
        let command = self.controller.decide(&self.intersection)?;

        match self.pacing {
            None => {
                self.intersection.step_epoch(command);
            }
            Some(pacing) => {
                self.intersection.apply_command(command);
                for _ in 0..self.intersection.ticks_per_epoch() {
                    self.paced_tick(pacing);
                }
            }
        }

        self.epochs += 1;
        Ok(())
    }

    /// Run until `days` full days have completed
    pub fn run_days(&mut self, days: usize) -> Result<RunSummary, SimulationError> {
        info!(controller = self.controller.name(), days, "run started");
        while self.intersection.day() < days {
            self.run_epoch()?;
        }
        let summary = RunSummary::from_days(self.completed_days());
        info!(
            cars_passed = summary.cars_passed,
            average_wait = summary.average_wait,
            "run finished"
        );
        Ok(summary)
    }

    /// Run the number of days named in the simulation config
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        let days = self.intersection.config().num_days;
        self.run_days(days)
    }

    pub fn completed_days(&self) -> &[DayStatistics] {
        self.intersection.completed_days()
    }

    pub fn into_intersection(self) -> Intersection {
        self.intersection
    }

    fn paced_tick(&mut self, pacing: Pacing) {
        let state = self.pace_state.get_or_insert_with(|| PaceState {
            origin: Instant::now(),
            ticks: 0,
            last_frame: None,
        });

        let sim_secs = state.ticks as f64 / f64::from(TICK_RATE);
        let target = Duration::try_from_secs_f64(sim_secs / pacing.time_scale)
            .ok()
            .and_then(|offset| state.origin.checked_add(offset));
        let now = Instant::now();
        if let Some(target) = target.filter(|t| *t > now) {
            thread::sleep(target - now);
        }
        state.ticks += 1;

        let now = Instant::now();
        let frame_due = state
            .last_frame
            .map_or(true, |last| now.duration_since(last) >= pacing.frame_interval);
        if frame_due {
            state.last_frame = Some(now);
        }

        self.intersection.tick();

        if frame_due {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_frame(&self.intersection.snapshot());
            }
        }
    }
}
