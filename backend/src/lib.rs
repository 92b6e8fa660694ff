//! Intersection Control Core - Rust Engine
//!
//! Car-following microsimulation of a four-way signalized junction, and a
//! finite-horizon MDP whose solved value table drives the signal.
//!
//! # Architecture
//!
//! - **core**: Simulation clock and constants
//! - **rng**: Deterministic random number generation
//! - **models**: Domain types (Car, Lane, Street, signal phases, bounded queue)
//! - **arrivals**: Time-of-day Poisson arrivals
//! - **signal**: Phase machine enforcing yellow and minimum-green rules
//! - **orchestrator**: Tick loop, statistics and the controller-in-the-loop runner
//! - **mdp**: State abstraction, transition model, value iteration, persistence
//! - **policy**: Signal controllers (optimal, fixed-time, actuated)
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded RNG)
//! 2. Cars in a lane are updated front to back within a tick
//! 3. Every value table is indexed by the same state enumeration

// Module declarations
pub mod arrivals;
pub mod core;
pub mod error;
pub mod mdp;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod rng;
pub mod signal;

// Re-exports for convenience
pub use crate::core::clock::SimulationClock;
pub use arrivals::{ArrivalCurve, ArrivalProcess};
pub use error::FatalError;
pub use mdp::{
    Action, DiscreteState, MdpConfig, MdpError, SolverConfig, TransitionModel, ValueIteration,
    ValueTable,
};
pub use models::{
    BoundedQueue, Car, Cardinal, Lane, LaneKind, QueueError, SignalColor, SignalGroup, SignalPhase,
    Street,
};
pub use orchestrator::{
    Intersection, Runner, SignalCommand, SimulationConfig, SimulationError, TickResult,
};
pub use policy::{ControllerError, SignalController};
pub use rng::SimRng;
pub use signal::{PhaseMachine, SwitchOutcome};
