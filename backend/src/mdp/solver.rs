//! Finite-horizon value iteration
//!
//! `V_0 = 0`, and for `h = 1..=H`:
//!
//! ```text
//! V_h[s] = max over admissible a of Σ_s' P(s'|s,a) · (R(s,a,s') + γ·V_{h-1}[s'])
//! ```
//!
//! Two generations are kept and swapped at each step. A step reads only the
//! previous generation and writes each state's entry independently, so the
//! sweep runs in parallel when the `parallel` feature is on.
//!
//! `V_h` is not monotone in `h` since rewards can be negative.

use crate::mdp::persistence::{compute_config_hash, Manifest, ValueTableStore};
use crate::mdp::state::DiscreteState;
use crate::mdp::transition::{MdpConfig, TransitionModel};
use crate::mdp::value::ValueTable;
use crate::mdp::MdpError;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Default number of backward-induction steps
pub const DEFAULT_HORIZON: usize = 15;

/// Discount and horizon of a training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub discount: f64,
    pub horizon: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount: 0.9,
            horizon: DEFAULT_HORIZON,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), MdpError> {
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(MdpError::InvalidConfig(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            )));
        }
        if self.horizon == 0 {
            return Err(MdpError::InvalidConfig("horizon must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Backward induction over the discrete state space
#[derive(Debug, Clone)]
pub struct ValueIteration {
    model: TransitionModel,
    discount: f64,
    horizon: usize,
    current: ValueTable,
    previous: ValueTable,
}

impl ValueIteration {
    /// Start from `V_0 = 0`
    pub fn new(model: TransitionModel, discount: f64) -> Self {
        Self::resume(model, discount, ValueTable::zeros(), 0)
    }

    /// Continue from a table already solved to `horizon`
    pub fn resume(
        model: TransitionModel,
        discount: f64,
        table: ValueTable,
        horizon: usize,
    ) -> Self {
        Self {
            model,
            discount,
            horizon,
            current: table,
            previous: ValueTable::zeros(),
        }
    }

    pub fn model(&self) -> &TransitionModel {
        &self.model
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Horizon of [`Self::current`]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn current(&self) -> &ValueTable {
        &self.current
    }

    pub fn into_current(self) -> ValueTable {
        self.current
    }

    /// Compute `V_{h+1}` from `V_h`
    pub fn step(&mut self) -> &ValueTable {
        std::mem::swap(&mut self.current, &mut self.previous);

        let model = &self.model;
        let previous = &self.previous;
        let discount = self.discount;
        let update = |(index, value): (usize, &mut f64)| {
            let state = DiscreteState::from_index_unchecked(index);
            *value = model.best_action(&state, previous, discount).1;
        };

        #[cfg(not(feature = "parallel"))]
        {
            self.current.as_mut_slice().iter_mut().enumerate().for_each(update);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.current.as_mut_slice().par_iter_mut().enumerate().for_each(update);
        }

        self.horizon += 1;
        &self.current
    }
}

/// Runs value iteration to a target horizon, persisting every step
pub struct Trainer {
    mdp: MdpConfig,
    solver: SolverConfig,
    store: ValueTableStore,
    resume: bool,
}

impl Trainer {
    pub fn new(mdp: MdpConfig, solver: SolverConfig, store: ValueTableStore) -> Self {
        Self {
            mdp,
            solver,
            store,
            resume: false,
        }
    }

    /// Continue from the latest compatible persisted horizon if one exists
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn store(&self) -> &ValueTableStore {
        &self.store
    }

    /// Train to the configured horizon and return the final table
    pub fn run(&self) -> Result<ValueTable, MdpError> {
        self.solver.validate()?;
        let model = TransitionModel::new(self.mdp.clone())?;
        let discount = self.solver.discount;
        let config_hash = compute_config_hash(&self.mdp, discount)?;

        let mut solver = match self.resume_point(&config_hash)? {
            Some((horizon, table)) => {
                info!(horizon, discount, "resuming value iteration");
                ValueIteration::resume(model, discount, table, horizon)
            }
            None => ValueIteration::new(model, discount),
        };

        while solver.horizon() < self.solver.horizon {
            let started = Instant::now();
            solver.step();
            let horizon = solver.horizon();

            let path = self.store.save(discount, horizon, solver.current())?;
            self.store.write_manifest(&Manifest {
                config_hash: config_hash.clone(),
                discount,
                latest_horizon: horizon,
            })?;

            info!(
                horizon,
                target = self.solver.horizon,
                elapsed_ms = started.elapsed().as_millis() as u64,
                path = %path.display(),
                "horizon step persisted"
            );
        }

        Ok(solver.into_current())
    }

    fn resume_point(&self, config_hash: &str) -> Result<Option<(usize, ValueTable)>, MdpError> {
        if !self.resume {
            return Ok(None);
        }
        let discount = self.solver.discount;
        let Some(manifest) = self.store.read_manifest(discount)? else {
            debug!(discount, "no manifest, training from scratch");
            return Ok(None);
        };
        if manifest.config_hash != config_hash {
            info!(discount, "persisted tables were trained under another model, ignoring them");
            return Ok(None);
        }

        let horizon = manifest.latest_horizon.min(self.solver.horizon);
        if horizon == 0 {
            return Ok(None);
        }
        let table = self.store.load(discount, horizon)?;
        Ok(Some((horizon, table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::state::StateSpace;
    use crate::mdp::transition::Action;

    #[test]
    fn test_solver_config_validation() {
        let discount_too_large = SolverConfig {
            discount: 1.5,
            horizon: 3,
        };
        let no_horizon = SolverConfig {
            discount: 0.5,
            horizon: 0,
        };
        assert!(discount_too_large.validate().is_err());
        assert!(no_horizon.validate().is_err());
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_one_step_is_greedy_reward() {
        let model = TransitionModel::new(MdpConfig::default()).unwrap();
        let mut solver = ValueIteration::new(model.clone(), 0.0);
        solver.step();
        assert_eq!(solver.horizon(), 1);

        for state in StateSpace::new().step_by(211) {
            let mut expected = model
                .expected_return(&state, Action::Wait, &ValueTable::zeros(), 0.0)
                .unwrap();
            if model.is_admissible(&state, Action::RequestSwitch) {
                let switch = model
                    .expected_return(&state, Action::RequestSwitch, &ValueTable::zeros(), 0.0)
                    .unwrap();
                expected = expected.max(switch);
            }
            assert!((solver.current().get(&state) - expected).abs() < 1e-9);
        }
    }
}
