//! Value-table controller
//!
//! Picks the admissible action with the best one-step lookahead value under
//! a solved table. In the terminal time bin it switches regardless, which
//! bounds the green time.

use super::{ControllerError, SignalController};
use crate::mdp::{
    Action, DiscreteState, MdpConfig, SolverConfig, TransitionModel, ValueTable, ValueTableStore,
};
use crate::orchestrator::{Intersection, SignalCommand};
use tracing::{debug, info};

pub struct OptimalController {
    model: TransitionModel,
    values: ValueTable,
    discount: f64,
    forced_switches: u64,
}

impl OptimalController {
    pub fn new(model: TransitionModel, values: ValueTable, discount: f64) -> Self {
        Self {
            model,
            values,
            discount,
            forced_switches: 0,
        }
    }

    /// Load the table persisted for `solver.horizon`; it must exist
    pub fn load(
        store: &ValueTableStore,
        mdp: MdpConfig,
        solver: SolverConfig,
    ) -> Result<Self, ControllerError> {
        solver.validate()?;
        let model = TransitionModel::new(mdp)?;
        let values = store
            .load(solver.discount, solver.horizon)
            .map_err(crate::mdp::MdpError::from)?;
        info!(discount = solver.discount, horizon = solver.horizon, "value table loaded");
        Ok(Self::new(model, values, solver.discount))
    }

    pub fn forced_switches(&self) -> u64 {
        self.forced_switches
    }

    /// Best admissible action in `state`, ties to `Wait`
    pub fn choose(&self, state: &DiscreteState) -> Result<Action, ControllerError> {
        let mut best: Option<(Action, f64)> = None;
        for action in Action::ALL {
            if !self.model.is_admissible(state, action) {
                continue;
            }
            let value = self.model.expected_return(state, action, &self.values, self.discount)?;
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((action, value));
            }
        }
        Ok(best.map_or(Action::Wait, |(action, _)| action))
    }
}

impl SignalController for OptimalController {
    fn name(&self) -> &'static str {
        "optimal"
    }

    fn decide(&mut self, intersection: &Intersection) -> Result<SignalCommand, ControllerError> {
        let state = DiscreteState::observe(intersection);
        if state.time.is_terminal() {
            self.forced_switches += 1;
            debug!(phase = ?state.phase, "terminal time bin, forcing switch");
            return Ok(SignalCommand::RequestSwitch);
        }
        Ok(self.choose(&state)?.command())
    }
}
