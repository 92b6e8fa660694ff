//! Fixed physical and timing parameters of the intersection model
//!
//! Distances are meters measured towards the stop line (positive before the
//! line, negative once a car has entered the junction). Speeds are m/s.

/// Simulation updates per simulated second
pub const TICK_RATE: u32 = 10;

/// Seconds between arrival draws
pub const SPAWN_INTERVAL_SECS: f64 = 5.0;

/// Upper bound (exclusive) of the spawn-count distribution per interval
pub const MAX_SPAWNED_CARS: usize = 10;

pub const CAR_LENGTH: f64 = 4.0;
pub const SAFETY_DISTANCE: f64 = 1.0;

/// Extra clearance on top of [`SAFETY_DISTANCE`] required before a follower accelerates
pub const ACCELERATION_GAP_MARGIN: f64 = 1.0;

/// 50 km/h
pub const MAX_SPEED: f64 = 14.0;

pub const SPAWN_POSITION: f64 = 200.0;

/// Upper bound (exclusive) of the uniform jitter added to a spawn position
pub const SPAWN_JITTER: f64 = 5.0;

/// Through/right cars leave the model here
pub const THROUGH_DESPAWN_POSITION: f64 = -20.0;

/// Left-turning cars stop mid-junction and leave the model here
pub const LEFT_DESPAWN_POSITION: f64 = -10.0;

pub const DEFAULT_LANE_CAPACITY: usize = 200;

pub const MIN_GREEN_SECS: f64 = 13.0;
pub const MAX_GREEN_SECS: f64 = 120.0;
pub const YELLOW_SECS: f64 = 4.0;

/// A yellow-to-green lane admits traffic once this much of the yellow has passed
pub const YELLOW_TO_GREEN_ENTRY_SECS: f64 = 1.0;

/// A yellow-to-red lane admits traffic only during this leading part of the yellow
pub const YELLOW_TO_RED_ENTRY_SECS: f64 = 2.0;

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 24.0 * SECONDS_PER_HOUR;

/// Interval between statistics samples
pub const SAMPLE_INTERVAL_SECS: f64 = 60.0;

/// Samples kept per simulated day
pub const DAILY_SAMPLES: usize = (SECONDS_PER_DAY / SAMPLE_INTERVAL_SECS) as usize;

/// Length of one controller decision epoch
pub const DECISION_EPOCH_SECS: f64 = 1.0;

pub const DEFAULT_SEED: u64 = 29_707_329;

/// Time for a car to traverse spawn → despawn at top speed with no interference
pub const FREE_FLOW_SECS: f64 = (SPAWN_POSITION - THROUGH_DESPAWN_POSITION) / MAX_SPEED;

/// Convert seconds to whole ticks at [`TICK_RATE`]
pub fn secs_to_ticks(secs: f64) -> u64 {
    (secs * TICK_RATE as f64).round() as u64
}

/// Convert a tick count to seconds at [`TICK_RATE`]
pub fn ticks_to_secs(ticks: u64) -> f64 {
    ticks as f64 / TICK_RATE as f64
}
