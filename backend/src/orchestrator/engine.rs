//! Intersection engine
//!
//! Owns the four streets, the signal phase machine, the clock, the RNG and
//! the statistics, and advances them together one tick (0.1 s) at a time.
//!
//! # Architecture
//!
//! ```text
//! For each tick:
//! 1. Expire a finished yellow phase, or waive min-green if every lane is empty
//! 2. Spawn arrivals if a spawn interval has passed
//! 3. For every lane, front to back:
//!    a. accelerate (or hold speed when boxed in)
//!    b. move, following the leader or stopping at the line
//!    c. despawn the front car past its exit, else accrue wait
//! 4. Advance the phase timer and the clock
//! 5. Sample statistics each minute; roll over the day at midnight
//! ```
//!
//! Cars are updated in place, so a follower sees its leader's position from
//! the current tick.
//!
//! # Example
//!
//! ```rust
//! use intersection_control_core::orchestrator::{Intersection, SimulationConfig, SignalCommand};
//!
//! let config = SimulationConfig { arrivals_enabled: false, ..Default::default() };
//! let mut intersection = Intersection::new(config).unwrap();
//!
//! intersection.step_epoch(SignalCommand::Hold);
//! assert_eq!(intersection.time_of_day_secs(), 1.0);
//! ```

use crate::arrivals::{add_car, ArrivalProcess};
use crate::core::clock::SimulationClock;
use crate::core::constants::{
    secs_to_ticks, ticks_to_secs, ACCELERATION_GAP_MARGIN, CAR_LENGTH, DECISION_EPOCH_SECS,
    DEFAULT_LANE_CAPACITY, DEFAULT_SEED, FREE_FLOW_SECS, LEFT_DESPAWN_POSITION, MAX_SPEED,
    SAFETY_DISTANCE, SECONDS_PER_DAY, TICK_RATE,
};
use crate::models::{Car, Cardinal, Lane, LaneKind, SignalPhase, Street};
use crate::orchestrator::snapshot::{CarView, IntersectionSnapshot, LaneSnapshot};
use crate::orchestrator::stats::DayStatistics;
use crate::policy::ControllerError;
use crate::rng::SimRng;
use crate::signal::{PhaseMachine, SwitchOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed; equal seeds give identical runs
    pub seed: u64,

    /// Seconds past midnight at which the run starts
    pub start_time_secs: f64,

    pub initial_phase: SignalPhase,

    /// Disable to drive the junction purely with [`Intersection::spawn_car`]
    pub arrivals_enabled: bool,

    /// Maximum cars per lane
    pub lane_capacity: usize,

    /// Days to simulate when driven by a runner
    pub num_days: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            start_time_secs: 0.0,
            initial_phase: SignalPhase::RedGreen,
            arrivals_enabled: true,
            lane_capacity: DEFAULT_LANE_CAPACITY,
            num_days: 1,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..SECONDS_PER_DAY).contains(&self.start_time_secs) {
            return Err(SimulationError::InvalidConfig(format!(
                "start_time_secs must be in [0, {}), got {}",
                SECONDS_PER_DAY, self.start_time_secs
            )));
        }
        if self.lane_capacity == 0 {
            return Err(SimulationError::InvalidConfig(
                "lane_capacity must be positive".to_string(),
            ));
        }
        if self.num_days == 0 {
            return Err(SimulationError::InvalidConfig("num_days must be positive".to_string()));
        }
        Ok(())
    }
}

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("controller failed: {0}")]
    Controller(#[from] ControllerError),
}

/// What a controller asks of the signal for the next epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalCommand {
    Hold,
    RequestSwitch,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickResult {
    /// A yellow phase expired this tick
    pub phase_advanced: bool,
    pub arrivals: usize,
    pub departures: usize,
    pub day_rolled_over: bool,
}

/// Result of one decision epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochResult {
    /// `None` when the command was [`SignalCommand::Hold`]
    pub switch: Option<SwitchOutcome>,
    pub arrivals: usize,
    pub departures: usize,
    pub day_rolled_over: bool,
}

// ============================================================================
// Intersection
// ============================================================================

/// The simulated junction
pub struct Intersection {
    config: SimulationConfig,
    streets: [Street; 4],
    phases: PhaseMachine,
    clock: SimulationClock,
    rng: SimRng,
    arrivals: ArrivalProcess,
    ticks_per_epoch: u64,
    history: Vec<DayStatistics>,
    today: DayStatistics,
}

impl Intersection {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let streets = Cardinal::ALL.map(|c| Street::new(c, config.lane_capacity));
        info!(
            seed = config.seed,
            start = config.start_time_secs,
            phase = ?config.initial_phase,
            "intersection initialised"
        );

        Ok(Self {
            phases: PhaseMachine::new(config.initial_phase),
            clock: SimulationClock::new(config.start_time_secs),
            rng: SimRng::new(config.seed),
            arrivals: ArrivalProcess::default(),
            ticks_per_epoch: secs_to_ticks(DECISION_EPOCH_SECS),
            history: Vec::new(),
            today: DayStatistics::new(0),
            streets,
            config,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn streets(&self) -> &[Street; 4] {
        &self.streets
    }

    pub fn street(&self, cardinal: Cardinal) -> &Street {
        &self.streets[cardinal.index()]
    }

    pub fn lane(&self, cardinal: Cardinal, kind: LaneKind) -> &Lane {
        self.street(cardinal).lane(kind)
    }

    pub fn phase(&self) -> SignalPhase {
        self.phases.phase()
    }

    pub fn phase_machine(&self) -> &PhaseMachine {
        &self.phases
    }

    pub fn phase_elapsed_secs(&self) -> f64 {
        self.phases.elapsed_secs()
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn time_of_day_secs(&self) -> f64 {
        self.clock.time_of_day_secs()
    }

    pub fn day(&self) -> usize {
        self.clock.day()
    }

    pub fn ticks_per_epoch(&self) -> u64 {
        self.ticks_per_epoch
    }

    /// Statistics of the day in progress
    pub fn today(&self) -> &DayStatistics {
        &self.today
    }

    /// Statistics of completed days
    pub fn completed_days(&self) -> &[DayStatistics] {
        &self.history
    }

    /// Cars in each street's through lane, indexed by [`Cardinal::index`]
    pub fn through_counts(&self) -> [usize; 4] {
        Cardinal::ALL.map(|c| self.lane(c, LaneKind::Through).count())
    }

    pub fn all_lanes_empty(&self) -> bool {
        self.streets.iter().all(|s| s.car_count() == 0)
    }

    /// Whether every lane of the axis the current phase serves is empty
    pub fn served_lanes_empty(&self) -> bool {
        let north_south = self.phases.phase().north_south_active();
        self.streets
            .iter()
            .filter(|s| s.cardinal().is_north_south() == north_south)
            .all(|s| s.car_count() == 0)
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Ask the phase machine to move on; lane occupancy waives min-green
    pub fn request_switch(&mut self) -> SwitchOutcome {
        let outcome = self.phases.request_switch(self.served_lanes_empty());
        if let SwitchOutcome::Switched { from, to } = outcome {
            debug!(?from, ?to, time = %self.clock.formatted(), "phase switched");
        }
        outcome
    }

    /// Apply a controller command without advancing time
    pub fn apply_command(&mut self, command: SignalCommand) -> Option<SwitchOutcome> {
        match command {
            SignalCommand::Hold => None,
            SignalCommand::RequestSwitch => Some(self.request_switch()),
        }
    }

    /// Apply `command` and run one decision epoch
    pub fn step_epoch(&mut self, command: SignalCommand) -> EpochResult {
        let switch = self.apply_command(command);
        let mut result = EpochResult {
            switch,
            arrivals: 0,
            departures: 0,
            day_rolled_over: false,
        };
        for _ in 0..self.ticks_per_epoch {
            let tick = self.tick();
            result.arrivals += tick.arrivals;
            result.departures += tick.departures;
            result.day_rolled_over |= tick.day_rolled_over;
        }
        result
    }

    /// Place one car at the tail of a lane; false if the lane is full
    pub fn spawn_car(&mut self, cardinal: Cardinal, kind: LaneKind) -> bool {
        let lane = self.streets[cardinal.index()].lane_mut(kind);
        add_car(lane, &mut self.rng)
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// Execute one tick; see the module docs for the ordering
    pub fn tick(&mut self) -> TickResult {
        let mut result = TickResult::default();

        // STEP 1: SIGNAL HOUSEKEEPING
        if self.phases.phase().is_yellow() {
            result.phase_advanced = self.phases.expire_yellow();
        } else if self.all_lanes_empty() {
            self.phases.waive_min_green();
        }

        // STEP 2: ARRIVALS
        if self.config.arrivals_enabled && self.clock.spawn_due() {
            let report = self
                .arrivals
                .spawn(&mut self.streets, self.clock.time_of_day_secs(), &mut self.rng);
            self.clock.mark_spawned();
            result.arrivals = report.total_spawned();
            self.today.dropped_arrivals += report.dropped.iter().sum::<usize>() as u64;
            for street in &self.streets {
                self.today.observe_queue(street.lane(LaneKind::Through).count());
            }
        }

        // STEP 3: CAR UPDATES
        for street in self.streets.iter_mut() {
            for lane in street.lanes_mut().iter_mut() {
                let admits = self.phases.admits(lane.group());
                result.departures += update_lane(lane, admits, &mut self.today);
            }
        }

        // STEP 4: TIME
        self.phases.advance_tick();
        self.today.ticks_elapsed += 1;
        let events = self.clock.advance_tick();

        // STEP 5: STATISTICS
        if events.sample_due {
            self.today.sample();
        }
        if events.day_rolled_over {
            let next = DayStatistics::new(self.clock.day());
            let finished = std::mem::replace(&mut self.today, next);
            info!(
                day = finished.day,
                cars_passed = finished.cars_passed,
                average_wait = finished.average_wait().unwrap_or(0.0),
                max_wait = finished.max_wait_time,
                "day completed"
            );
            self.history.push(finished);
            result.day_rolled_over = true;
        }

        result
    }

    /// Frame of the current state
    pub fn snapshot(&self) -> IntersectionSnapshot {
        let lanes = self
            .streets
            .iter()
            .flat_map(|s| s.lanes().iter())
            .map(|lane| LaneSnapshot {
                street: lane.street(),
                kind: lane.kind(),
                count: lane.count(),
                cars: lane
                    .cars()
                    .iter()
                    .map(|c| CarView {
                        position: c.position,
                        speed: c.speed,
                    })
                    .collect(),
            })
            .collect();

        IntersectionSnapshot {
            day: self.clock.day(),
            time_of_day_secs: self.clock.time_of_day_secs(),
            phase: self.phases.phase(),
            phase_elapsed_secs: self.phases.elapsed_secs(),
            lanes,
        }
    }
}

// ============================================================================
// Car Physics
// ============================================================================

/// Acceleration at `speed` (m/s²)
pub fn acceleration(speed: f64) -> f64 {
    1.9625 * (0.093 * speed / 3.6).exp()
}

fn tick_secs() -> f64 {
    ticks_to_secs(1)
}

/// Speed up unless the gap to the leader is too short
fn accelerate(car: &mut Car, leader: Option<&Car>) {
    let free = match leader {
        None => true,
        Some(l) => {
            car.position - (l.position + CAR_LENGTH) > SAFETY_DISTANCE + ACCELERATION_GAP_MARGIN
        }
    };
    if free {
        car.speed += acceleration(car.speed) / TICK_RATE as f64;
    }
    car.speed = car.speed.clamp(0.0, MAX_SPEED);
}

/// Move one tick, either tucking in behind the leader or obeying the stop line
fn advance(car: &mut Car, leader: Option<&Car>, admits: bool, kind: LaneKind) {
    let mut step = car.speed * tick_secs();

    if let Some(l) = leader {
        let gap = (car.position - step) - (l.position + CAR_LENGTH);
        if gap <= SAFETY_DISTANCE {
            car.speed = 0.8 * l.speed;
            car.position = l.position + CAR_LENGTH + SAFETY_DISTANCE;
            return;
        }
    }

    if admits || car.has_crossed() {
        // Left turners leave the model at the edge of the box
        if kind == LaneKind::Left && car.position - step < LEFT_DESPAWN_POSITION {
            step = car.position - LEFT_DESPAWN_POSITION;
            car.speed = 0.0;
        }
    } else if car.position - step < 0.0 {
        step = car.position;
        car.speed = 0.0;
    }

    car.position -= step;
}

/// Update every car in `lane`, returning the number of departures
fn update_lane(lane: &mut Lane, admits: bool, stats: &mut DayStatistics) -> usize {
    let street = lane.street();
    let kind = lane.kind();
    let despawn_at = lane.despawn_position();
    let mut departures = 0;
    let mut i = 0;

    while i < lane.count() {
        let leader = if i == 0 { None } else { lane.cars().get(i - 1).copied() };
        let Some(car) = lane.cars_mut().get_mut(i) else {
            break;
        };

        accelerate(car, leader.as_ref());
        advance(car, leader.as_ref(), admits, kind);

        // Followers never pass their leader, so only the front car can leave
        if i == 0 && car.position <= despawn_at {
            if let Some(departed) = lane.cars_mut().dequeue() {
                let wait = (departed.wait_time - FREE_FLOW_SECS).max(0.0);
                stats.record_departure(street, kind, wait);
                departures += 1;
            }
            continue;
        }

        car.wait_time += tick_secs();
        i += 1;
    }

    departures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Intersection {
        Intersection::new(SimulationConfig {
            arrivals_enabled: false,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let bad = SimulationConfig {
            lane_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(Intersection::new(bad), Err(SimulationError::InvalidConfig(_))));

        let bad = SimulationConfig {
            start_time_secs: SECONDS_PER_DAY,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_acceleration_at_rest() {
        assert!((acceleration(0.0) - 1.9625).abs() < 1e-12);
        assert!(acceleration(10.0) > acceleration(0.0));
    }

    #[test]
    fn test_empty_junction_waives_min_green() {
        let mut x = quiet();
        x.tick();
        // Housekeeping sets the timer to min-green, then the tick adds one
        assert_eq!(x.phase_machine().elapsed_ticks(), 131);
        assert!(x.request_switch().switched());
    }

    #[test]
    fn test_red_holds_car_at_stop_line() {
        let mut x = quiet();
        assert!(x.spawn_car(Cardinal::North, LaneKind::Through));
        for _ in 0..600 {
            x.step_epoch(SignalCommand::Hold);
        }
        let lane = x.lane(Cardinal::North, LaneKind::Through);
        assert_eq!(lane.count(), 1);
        let car = lane.cars().front().unwrap();
        assert_eq!(car.position, 0.0);
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_green_through_car_departs_without_wait() {
        let mut x = quiet();
        assert!(x.spawn_car(Cardinal::East, LaneKind::Through));
        for _ in 0..30 {
            x.step_epoch(SignalCommand::Hold);
        }
        assert_eq!(x.lane(Cardinal::East, LaneKind::Through).count(), 0);
        let stats = x.today();
        assert_eq!(stats.cars_passed, 1);
        assert!(stats.max_wait_time < 0.5);
    }

    #[test]
    fn test_left_lane_never_served() {
        let mut x = quiet();
        assert!(x.spawn_car(Cardinal::East, LaneKind::Left));
        for _ in 0..60 {
            x.step_epoch(SignalCommand::Hold);
        }
        let lane = x.lane(Cardinal::East, LaneKind::Left);
        assert_eq!(lane.count(), 1);
        assert_eq!(lane.cars().front().unwrap().position, 0.0);
    }
}
