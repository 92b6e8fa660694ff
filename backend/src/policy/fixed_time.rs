//! Fixed-time controller
//!
//! Alternates fixed greens on the two axes. East-west carries the heavier
//! peak flows, so its green is stretched during the morning and afternoon
//! peaks.

use super::{ControllerError, SignalController};
use crate::core::constants::MAX_GREEN_SECS;
use crate::models::SignalPhase;
use crate::orchestrator::{Intersection, SignalCommand};
use serde::{Deserialize, Serialize};

/// Green times and peak windows (seconds past midnight)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedTimePlan {
    pub green_secs: f64,
    pub morning_peak: (f64, f64),
    pub morning_factor: f64,
    pub afternoon_peak: (f64, f64),
    pub afternoon_factor: f64,
}

impl Default for FixedTimePlan {
    fn default() -> Self {
        Self {
            green_secs: 20.0,
            morning_peak: (26_400.0, 30_000.0),
            morning_factor: 1.25,
            afternoon_peak: (54_600.0, 58_200.0),
            afternoon_factor: 1.5,
        }
    }
}

impl FixedTimePlan {
    /// Scaling applied to the east-west green at `time_of_day_secs`
    pub fn peak_factor(&self, time_of_day_secs: f64) -> f64 {
        let within = |(start, end): (f64, f64)| (start..=end).contains(&time_of_day_secs);
        if within(self.morning_peak) {
            self.morning_factor
        } else if within(self.afternoon_peak) {
            self.afternoon_factor
        } else {
            1.0
        }
    }

    /// Green time for a dwell phase; `None` for yellow phases
    pub fn green_for(&self, phase: SignalPhase, time_of_day_secs: f64) -> Option<f64> {
        match phase {
            SignalPhase::GreenRed => Some(self.green_secs),
            SignalPhase::RedGreen => Some(self.green_secs * self.peak_factor(time_of_day_secs)),
            _ => None,
        }
    }
}

pub struct FixedTimeController {
    plan: FixedTimePlan,
}

impl FixedTimeController {
    pub fn new(plan: FixedTimePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &FixedTimePlan {
        &self.plan
    }
}

impl Default for FixedTimeController {
    fn default() -> Self {
        Self::new(FixedTimePlan::default())
    }
}

impl SignalController for FixedTimeController {
    fn name(&self) -> &'static str {
        "fixed-time"
    }

    fn decide(&mut self, intersection: &Intersection) -> Result<SignalCommand, ControllerError> {
        let Some(green) = self
            .plan
            .green_for(intersection.phase(), intersection.time_of_day_secs())
        else {
            return Ok(SignalCommand::Hold);
        };
        if intersection.phase_elapsed_secs() >= green.min(MAX_GREEN_SECS) {
            Ok(SignalCommand::RequestSwitch)
        } else {
            Ok(SignalCommand::Hold)
        }
    }
}
