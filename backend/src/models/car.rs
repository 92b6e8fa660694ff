//! Car model
//!
//! A car exists only while it sits in a lane's queue; queue membership is its
//! active flag. Position counts down towards the stop line and goes negative
//! once the car is inside the junction.

use crate::core::constants::MAX_SPEED;
use crate::models::lane::LaneKind;
use serde::{Deserialize, Serialize};

/// A single vehicle
///
/// # Example
/// ```
/// use intersection_control_core::{Car, LaneKind};
///
/// let car = Car::spawned(LaneKind::Through, 203.5);
/// assert_eq!(car.speed, 14.0);
/// assert!(!car.has_crossed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Car {
    /// Movement the driver intends at the junction
    pub intent: LaneKind,

    /// Current speed (m/s)
    pub speed: f64,

    /// Meters to the stop line; negative after crossing
    pub position: f64,

    /// Seconds spent in the model so far
    pub wait_time: f64,
}

impl Car {
    /// New car entering the model at top speed
    pub fn spawned(intent: LaneKind, position: f64) -> Self {
        Self {
            intent,
            speed: MAX_SPEED,
            position,
            wait_time: 0.0,
        }
    }

    /// True once the car is past the stop line
    pub fn has_crossed(&self) -> bool {
        self.position < 0.0
    }
}
