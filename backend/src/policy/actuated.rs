//! Queue-actuated controller
//!
//! Sizes both greens of a cycle when the north-south green starts, from the
//! longest through-lane queue on each axis, and cuts a green short once every
//! lane it serves has emptied.

use super::{ControllerError, SignalController};
use crate::core::constants::{MAX_GREEN_SECS, MIN_GREEN_SECS};
use crate::models::{Cardinal, SignalPhase};
use crate::orchestrator::{Intersection, SignalCommand};
use tracing::trace;

/// Green times `(north_south, east_west)` for the given through-lane counts
///
/// The shorter axis gets `10 + min(max_ns, max_ew)` seconds; the busier one
/// gets that times `sqrt(floor(ratio))`. Both are clamped to the green limits.
pub fn green_targets(through_counts: [usize; 4]) -> (f64, f64) {
    let count = |c: Cardinal| through_counts[c.index()];
    let max_ns = count(Cardinal::North).max(count(Cardinal::South));
    let max_ew = count(Cardinal::East).max(count(Cardinal::West));

    let base = 10.0 + max_ns.min(max_ew) as f64;
    let ns = max_ns.max(1) as f64;
    let ew = max_ew.max(1) as f64;

    let fairness = |ratio: f64| ratio.floor().sqrt();
    let (ns_green, ew_green) = if ns > ew {
        (base * fairness(ns / ew), base)
    } else {
        (base, base * fairness(ew / ns))
    };

    let clamp = |g: f64| g.clamp(MIN_GREEN_SECS, MAX_GREEN_SECS);
    (clamp(ns_green), clamp(ew_green))
}

#[derive(Debug, Default)]
pub struct ActuatedController {
    /// Green phase the target was taken for
    sized_for: Option<SignalPhase>,
    target_secs: f64,

    /// `(north_south, east_west)` greens of the current cycle
    cycle_plan: Option<(f64, f64)>,
}

impl ActuatedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_secs(&self) -> Option<f64> {
        self.sized_for.map(|_| self.target_secs)
    }

    pub fn cycle_plan(&self) -> Option<(f64, f64)> {
        self.cycle_plan
    }
}

impl SignalController for ActuatedController {
    fn name(&self) -> &'static str {
        "actuated"
    }

    fn decide(&mut self, intersection: &Intersection) -> Result<SignalCommand, ControllerError> {
        let phase = intersection.phase();
        if !phase.is_green_dwell() {
            self.sized_for = None;
            return Ok(SignalCommand::Hold);
        }

        if self.sized_for != Some(phase) {
            // A run that starts mid-cycle plans from the queues it first sees
            let plan = match self.cycle_plan {
                Some(plan) if !phase.north_south_active() => plan,
                _ => {
                    let plan = green_targets(intersection.through_counts());
                    trace!(north_south = plan.0, east_west = plan.1, "cycle planned");
                    plan
                }
            };
            self.cycle_plan = Some(plan);
            self.target_secs = if phase.north_south_active() { plan.0 } else { plan.1 };
            self.sized_for = Some(phase);
            trace!(?phase, target = self.target_secs, "green sized");
        }

        if intersection.phase_elapsed_secs() >= self.target_secs
            || intersection.served_lanes_empty()
        {
            Ok(SignalCommand::RequestSwitch)
        } else {
            Ok(SignalCommand::Hold)
        }
    }
}
