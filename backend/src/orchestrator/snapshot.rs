//! Read-only observation of the junction for display layers

use crate::models::{Cardinal, LaneKind, SignalPhase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarView {
    pub position: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub street: Cardinal,
    pub kind: LaneKind,
    pub count: usize,
    /// Front to back
    pub cars: Vec<CarView>,
}

/// Frame handed to a renderer or logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionSnapshot {
    pub day: usize,
    pub time_of_day_secs: f64,
    pub phase: SignalPhase,
    pub phase_elapsed_secs: f64,
    pub lanes: Vec<LaneSnapshot>,
}

impl IntersectionSnapshot {
    pub fn lane(&self, street: Cardinal, kind: LaneKind) -> Option<&LaneSnapshot> {
        self.lanes.iter().find(|l| l.street == street && l.kind == kind)
    }
}
