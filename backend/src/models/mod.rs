//! Network model: cars, lanes, streets and the signal phase table

pub mod car;
pub mod lane;
pub mod phase;
pub mod queue;
pub mod street;

// Re-exports
pub use car::Car;
pub use lane::{Lane, LaneKind};
pub use phase::{SignalColor, SignalGroup, SignalPhase};
pub use queue::{BoundedQueue, QueueError};
pub use street::{Cardinal, Street};
