//! Transition and reward model
//!
//! `P(s'|s,a) = P_phase · P_time · Π_dir P_car`. Each car factor is read
//! from a kernel precomputed per direction and lane state: it averages over
//! the exact count inside the source bin (uniform prior), a truncated Poisson
//! number of arrivals, and for open lanes a truncated Poisson number of
//! departures.

use crate::arrivals::poisson_pmf;
use crate::core::constants::SECONDS_PER_HOUR;
use crate::mdp::state::{
    CarBin, Direction, DiscreteState, TimeBin, CAR_BINS, CAR_BIN_BOUNDS, DIRECTIONS,
};
use crate::mdp::value::ValueTable;
use crate::mdp::MdpError;
use crate::models::SignalPhase;
use crate::orchestrator::SignalCommand;
use serde::{Deserialize, Serialize};

/// Controller action at a decision epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Wait,
    RequestSwitch,
}

impl Action {
    /// `Wait` first, so ties resolve to it
    pub const ALL: [Action; 2] = [Action::Wait, Action::RequestSwitch];

    pub fn command(self) -> SignalCommand {
        match self {
            Action::Wait => SignalCommand::Hold,
            Action::RequestSwitch => SignalCommand::RequestSwitch,
        }
    }
}

/// Parameters of the transition and reward model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdpConfig {
    /// Arrival rate per direction (veh/h), in [`Direction`] order
    pub arrival_rates_per_hour: [f64; DIRECTIONS],

    /// Most arrivals counted per epoch
    pub arrival_cap: usize,

    /// Most departures per epoch from an open lane
    pub discharge_capacity: usize,

    /// Mean departures per epoch from an open lane before truncation
    pub discharge_mean: f64,

    /// Expected epochs a yellow phase lasts
    pub yellow_epochs: u32,

    /// Simulated seconds per decision epoch
    pub epoch_secs: f64,

    /// Per car bin, for a lane that is open in the next state
    pub rewards: [f64; CAR_BINS],

    /// Per car bin, for a lane that is closed in the next state
    pub penalties: [f64; CAR_BINS],
}

impl Default for MdpConfig {
    fn default() -> Self {
        Self {
            arrival_rates_per_hour: [48.69, 416.2, 313.74, 606.24],
            arrival_cap: 3,
            discharge_capacity: 3,
            discharge_mean: 1.0,
            yellow_epochs: 4,
            epoch_secs: 1.0,
            rewards: [-0.5, 2.0, 6.0, 12.0, 20.0, 77.0],
            penalties: [0.5, -2.0, -6.0, -12.0, -20.0, -77.0],
        }
    }
}

impl MdpConfig {
    pub fn validate(&self) -> Result<(), MdpError> {
        if self.arrival_rates_per_hour.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(MdpError::InvalidConfig(
                "arrival rates must be finite and non-negative".to_string(),
            ));
        }
        if !self.discharge_mean.is_finite() || self.discharge_mean < 0.0 {
            return Err(MdpError::InvalidConfig("discharge_mean must be non-negative".to_string()));
        }
        if self.yellow_epochs == 0 {
            return Err(MdpError::InvalidConfig("yellow_epochs must be positive".to_string()));
        }
        if !(self.epoch_secs > 0.0) {
            return Err(MdpError::InvalidConfig("epoch_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Whether `direction` may discharge under `phase`
///
/// The whole half-cycle counts, yellows included.
pub fn lane_open(phase: SignalPhase, direction: Direction) -> bool {
    phase.north_south_active() == direction.is_north_south()
}

/// `P(to | from)` per car bin
type CarKernel = [[f64; CAR_BINS]; CAR_BINS];

/// Probability law over `0..=cap`, renormalised
fn truncated_poisson(mean: f64, cap: usize) -> Vec<f64> {
    let mut pmf: Vec<f64> = (0..=cap).map(|k| poisson_pmf(k, mean)).collect();
    let mass: f64 = pmf.iter().sum();
    pmf.iter_mut().for_each(|p| *p /= mass);
    pmf
}

fn build_kernel(arrivals: &[f64], departures: Option<&[f64]>) -> CarKernel {
    let mut kernel = [[0.0; CAR_BINS]; CAR_BINS];

    for (from, row) in kernel.iter_mut().enumerate() {
        let (lo, hi) = CAR_BIN_BOUNDS[from];
        let prior = 1.0 / (hi - lo + 1) as f64;

        for n in lo..=hi {
            for (z, pz) in arrivals.iter().enumerate() {
                let present = n + z;
                match departures {
                    None => row[CarBin::from_count(present).index()] += prior * pz,
                    Some(law) => {
                        // Departures beyond the cars present all mean "everyone leaves"
                        for (r, pr) in law.iter().enumerate() {
                            let left = present.saturating_sub(r);
                            row[CarBin::from_count(left).index()] += prior * pz * pr;
                        }
                    }
                }
            }
        }
    }

    kernel
}

/// Up to two outcomes of a factor; zero-probability slots are skipped
type Outcomes<T> = [(T, f64); 2];

/// The transition and reward model
#[derive(Debug, Clone)]
pub struct TransitionModel {
    config: MdpConfig,
    /// `[direction][open as usize]`
    kernels: [[CarKernel; 2]; DIRECTIONS],
}

impl TransitionModel {
    pub fn new(config: MdpConfig) -> Result<Self, MdpError> {
        config.validate()?;

        let departures = truncated_poisson(config.discharge_mean, config.discharge_capacity);
        let mut kernels = [[[[0.0; CAR_BINS]; CAR_BINS]; 2]; DIRECTIONS];
        for direction in Direction::ALL {
            let per_epoch = config.arrival_rates_per_hour[direction.index()] / SECONDS_PER_HOUR
                * config.epoch_secs;
            let arrivals = truncated_poisson(per_epoch, config.arrival_cap);
            kernels[direction.index()] = [
                build_kernel(&arrivals, None),
                build_kernel(&arrivals, Some(&departures)),
            ];
        }

        Ok(Self { config, kernels })
    }

    pub fn config(&self) -> &MdpConfig {
        &self.config
    }

    /// `Wait` always; `RequestSwitch` only from a green dwell that has left
    /// the first time bin or whose served lanes are both empty
    pub fn is_admissible(&self, state: &DiscreteState, action: Action) -> bool {
        match action {
            Action::Wait => true,
            Action::RequestSwitch => {
                if !state.phase.is_green_dwell() {
                    return false;
                }
                state.time != TimeBin::FIRST
                    || Direction::ALL
                        .iter()
                        .filter(|d| lane_open(state.phase, **d))
                        .all(|d| state.car_bin(*d).is_empty())
            }
        }
    }

    fn phase_outcomes(&self, state: &DiscreteState, action: Action) -> Outcomes<SignalPhase> {
        let phase = state.phase;
        match action {
            Action::Wait if phase.is_yellow() => {
                let advance = 1.0 / f64::from(self.config.yellow_epochs);
                [(phase.next(), advance), (phase, 1.0 - advance)]
            }
            Action::Wait => [(phase, 1.0), (phase, 0.0)],
            Action::RequestSwitch => [(phase.next(), 1.0), (phase, 0.0)],
        }
    }

    fn time_outcomes(&self, state: &DiscreteState, action: Action) -> Outcomes<TimeBin> {
        let time = state.time;
        match (action, time.next()) {
            (Action::Wait, Some(next)) => {
                let advance = 1.0 / time.width() as f64;
                [(next, advance), (time, 1.0 - advance)]
            }
            // Terminal bin forces a decision, after which the timer restarts
            (Action::Wait, None) | (Action::RequestSwitch, _) => {
                [(TimeBin::FIRST, 1.0), (TimeBin::FIRST, 0.0)]
            }
        }
    }

    fn car_row(&self, state: &DiscreteState, direction: Direction) -> &[f64; CAR_BINS] {
        let open = lane_open(state.phase, direction) as usize;
        &self.kernels[direction.index()][open][state.car_bin(direction).index()]
    }

    /// `P(next | state, action)`; zero when the action is not admissible
    pub fn probability(&self, state: &DiscreteState, action: Action, next: &DiscreteState) -> f64 {
        if !self.is_admissible(state, action) {
            return 0.0;
        }

        let mut p: f64 = self
            .phase_outcomes(state, action)
            .iter()
            .filter(|(phase, _)| *phase == next.phase)
            .map(|(_, p)| p)
            .sum();
        if p == 0.0 {
            return 0.0;
        }

        p *= self
            .time_outcomes(state, action)
            .iter()
            .filter(|(time, _)| *time == next.time)
            .map(|(_, p)| p)
            .sum::<f64>();
        if p == 0.0 {
            return 0.0;
        }

        for direction in Direction::ALL {
            p *= self.car_row(state, direction)[next.car_bin(direction).index()];
            if p == 0.0 {
                return 0.0;
            }
        }
        p
    }

    /// Visit every successor with nonzero probability
    ///
    /// Visits nothing when the action is not admissible.
    pub fn for_each_successor<F>(&self, state: &DiscreteState, action: Action, mut visit: F)
    where
        F: FnMut(&DiscreteState, f64),
    {
        if !self.is_admissible(state, action) {
            return;
        }

        let rows = Direction::ALL.map(|d| self.car_row(state, d));
        let mut next = *state;

        for &(phase, p_phase) in &self.phase_outcomes(state, action) {
            if p_phase == 0.0 {
                continue;
            }
            next.phase = phase;
            for &(time, p_time) in &self.time_outcomes(state, action) {
                if p_time == 0.0 {
                    continue;
                }
                next.time = time;
                let p = p_phase * p_time;

                for (n, &p_n) in rows[0].iter().enumerate().filter(|(_, p)| **p > 0.0) {
                    next.cars[0] = CarBin::from_index_unchecked(n);
                    for (s, &p_s) in rows[1].iter().enumerate().filter(|(_, p)| **p > 0.0) {
                        next.cars[1] = CarBin::from_index_unchecked(s);
                        for (e, &p_e) in rows[2].iter().enumerate().filter(|(_, p)| **p > 0.0) {
                            next.cars[2] = CarBin::from_index_unchecked(e);
                            for (w, &p_w) in rows[3].iter().enumerate().filter(|(_, p)| **p > 0.0) {
                                next.cars[3] = CarBin::from_index_unchecked(w);
                                visit(&next, p * p_n * p_s * p_e * p_w);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Reward collected on arriving in `next`
    pub fn state_reward(&self, next: &DiscreteState) -> f64 {
        Direction::ALL
            .iter()
            .map(|&d| {
                let bin = next.car_bin(d).index();
                if lane_open(next.phase, d) {
                    self.config.rewards[bin]
                } else {
                    self.config.penalties[bin]
                }
            })
            .sum()
    }

    /// `R(s, a, s')`; zero for inadmissible actions and impossible transitions
    pub fn reward(
        &self,
        state: &DiscreteState,
        action: Action,
        next: &DiscreteState,
        probability: f64,
    ) -> f64 {
        if probability == 0.0 || !self.is_admissible(state, action) {
            return 0.0;
        }
        self.state_reward(next)
    }

    /// `Σ_s' P(s'|s,a) · (R + γ·V[s'])` for an action known to be admissible
    pub(crate) fn backup(
        &self,
        state: &DiscreteState,
        action: Action,
        values: &ValueTable,
        discount: f64,
    ) -> f64 {
        let mut total = 0.0;
        self.for_each_successor(state, action, |next, p| {
            total += p * (self.state_reward(next) + discount * values.get(next));
        });
        total
    }

    /// One-step lookahead value of `action`
    pub fn expected_return(
        &self,
        state: &DiscreteState,
        action: Action,
        values: &ValueTable,
        discount: f64,
    ) -> Result<f64, MdpError> {
        if !self.is_admissible(state, action) {
            return Err(MdpError::InadmissibleAction {
                action,
                state_index: state.to_index(),
            });
        }
        Ok(self.backup(state, action, values, discount))
    }

    /// Admissible action with the highest lookahead value, ties to `Wait`
    pub fn best_action(
        &self,
        state: &DiscreteState,
        values: &ValueTable,
        discount: f64,
    ) -> (Action, f64) {
        let mut best = (Action::Wait, self.backup(state, Action::Wait, values, discount));
        if self.is_admissible(state, Action::RequestSwitch) {
            let value = self.backup(state, Action::RequestSwitch, values, discount);
            if value > best.1 {
                best = (Action::RequestSwitch, value);
            }
        }
        best
    }
}
