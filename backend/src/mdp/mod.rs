//! Markov decision process for the signal controller
//!
//! # Key Principles
//!
//! - **One ordering**: every table is indexed by [`DiscreteState::to_index`].
//! - **Factorised transitions**: time bin, phase and each direction's car bin
//!   move independently given the current state and action.
//! - **Finite horizon**: value iteration runs backward from `V_0 = 0` for a
//!   fixed number of steps, persisting each step.

pub mod persistence;
pub mod solver;
pub mod state;
pub mod transition;
pub mod value;

pub use persistence::{compute_config_hash, Manifest, PersistenceError, ValueTableStore};
pub use solver::{SolverConfig, Trainer, ValueIteration};
pub use state::{
    CarBin, Direction, DiscreteState, StateSpace, TimeBin, CAR_BINS, CAR_BIN_BOUNDS, DIRECTIONS,
    STATE_COUNT, TIME_BINS, TIME_BIN_BOUNDS,
};
pub use transition::{lane_open, Action, MdpConfig, TransitionModel};
pub use value::ValueTable;

use thiserror::Error;

/// Errors raised by the state abstraction, model and solver
#[derive(Debug, Error)]
pub enum MdpError {
    #[error("action {action:?} is not admissible in state {state_index}")]
    InadmissibleAction { action: Action, state_index: usize },

    #[error("state index {index} is out of range")]
    StateIndexOutOfRange { index: usize },

    #[error("direction index {index} is out of range")]
    DirectionOutOfRange { index: usize },

    #[error("invalid MDP config: {0}")]
    InvalidConfig(String),

    #[error("value table has {found} entries, expected {expected}")]
    TableSize { expected: usize, found: usize },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
