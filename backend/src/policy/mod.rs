//! Signal controller policies
//!
//! # Overview
//!
//! A controller looks at the junction once per decision epoch (one simulated
//! second) and either holds the current phase or asks the phase machine to
//! move on. The phase machine still enforces yellow and minimum-green rules,
//! so a controller can never produce an unsafe sequence.
//!
//! # Policy Interface
//!
//! All controllers implement the `SignalController` trait:
//! ```rust
//! use intersection_control_core::orchestrator::{Intersection, SignalCommand};
//! use intersection_control_core::policy::{ControllerError, SignalController};
//!
//! struct AlwaysHold;
//!
//! impl SignalController for AlwaysHold {
//!     fn name(&self) -> &'static str {
//!         "always-hold"
//!     }
//!
//!     fn decide(
//!         &mut self,
//!         _intersection: &Intersection,
//!     ) -> Result<SignalCommand, ControllerError> {
//!         Ok(SignalCommand::Hold)
//!     }
//! }
//! ```
//!
//! Available controllers:
//! 1. **Optimal**: one-step lookahead on a solved value table
//! 2. **FixedTime**: fixed green splits with peak-hour scaling
//! 3. **Actuated**: green sized from the queues when it starts

use crate::mdp::{MdpConfig, MdpError, SolverConfig, ValueTableStore};
use crate::orchestrator::{Intersection, SignalCommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod actuated;
pub mod fixed_time;
pub mod optimal;

pub use actuated::{green_targets, ActuatedController};
pub use fixed_time::{FixedTimeController, FixedTimePlan};
pub use optimal::OptimalController;

/// Controller failure; always fatal to the run
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Mdp(#[from] MdpError),
}

/// Decides the signal command for each decision epoch
pub trait SignalController {
    fn name(&self) -> &'static str;

    /// Called once per epoch before the epoch's ticks run
    fn decide(&mut self, intersection: &Intersection) -> Result<SignalCommand, ControllerError>;
}

/// Controller selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    Optimal {
        table_dir: PathBuf,
        #[serde(default)]
        solver: SolverConfig,
        #[serde(default)]
        mdp: MdpConfig,
    },
    FixedTime {
        #[serde(default)]
        plan: FixedTimePlan,
    },
    Actuated,
}

/// Build the controller named by `config`
pub fn create_controller(
    config: &ControllerConfig,
) -> Result<Box<dyn SignalController>, ControllerError> {
    Ok(match config {
        ControllerConfig::Optimal { table_dir, solver, mdp } => {
            let store = ValueTableStore::new(table_dir.clone());
            Box::new(OptimalController::load(&store, mdp.clone(), *solver)?)
        }
        ControllerConfig::FixedTime { plan } => Box::new(FixedTimeController::new(*plan)),
        ControllerConfig::Actuated => Box::new(ActuatedController::new()),
    })
}
