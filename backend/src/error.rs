//! Top-level error
//!
//! Every failure in this crate is fatal to the run. Lower layers raise their
//! own error types at the point of violation; `FatalError` collects them for
//! the single handler at the outermost loop.

use crate::mdp::{MdpError, PersistenceError};
use crate::models::QueueError;
use crate::orchestrator::SimulationError;
use crate::policy::ControllerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Mdp(#[from] MdpError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
