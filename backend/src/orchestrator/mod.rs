//! Orchestrator - the intersection tick loop and its drivers
//!
//! See `engine.rs` for the tick ordering and car physics.

pub mod engine;
pub mod runner;
pub mod snapshot;
pub mod stats;

pub use engine::{
    acceleration, EpochResult, Intersection, SignalCommand, SimulationConfig, SimulationError,
    TickResult,
};
pub use runner::{FrameObserver, Pacing, Runner};
pub use snapshot::{CarView, IntersectionSnapshot, LaneSnapshot};
pub use stats::{averaged_series, write_series_csv, DayStatistics, RunSummary};
