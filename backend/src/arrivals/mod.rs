//! Time-varying Poisson arrivals
//!
//! Every spawn interval each street draws how many cars join its through/right
//! lane. The draw inverts a cumulative Poisson table over `0..MAX_SPAWNED_CARS`
//! with a single uniform sample; probability mass beyond the table is treated
//! as zero arrivals.
//!
//! # Key Principles
//!
//! 1. **Determinism**: same seed and start time produce the same arrivals
//! 2. **Per-street demand**: each street follows its own fitted daily curve
//! 3. **Physical placement**: new cars never overlap the tail of the queue
//!
//! # Example
//!
//! ```
//! use intersection_control_core::arrivals::{ArrivalCurve, ArrivalProcess};
//! use intersection_control_core::{Cardinal, SimRng, Street};
//!
//! let mut streets = Cardinal::ALL.map(|c| Street::new(c, 200));
//! let mut rng = SimRng::new(42);
//! let process = ArrivalProcess::default();
//!
//! let report = process.spawn(&mut streets, 8.0 * 3600.0, &mut rng);
//! assert!(report.spawned.iter().all(|&n| n < 10));
//!
//! let west = ArrivalCurve::for_street(Cardinal::West);
//! assert!(west.rate_per_hour(8.0 * 3600.0) > 0.0);
//! ```

use crate::core::constants::{
    CAR_LENGTH, MAX_SPAWNED_CARS, SAFETY_DISTANCE, SECONDS_PER_HOUR, SPAWN_INTERVAL_SECS,
    SPAWN_JITTER, SPAWN_POSITION,
};
use crate::models::{Car, Cardinal, Lane, LaneKind, Street};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `scale * base^x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialSegment {
    pub scale: f64,
    pub base: f64,
}

impl ExponentialSegment {
    fn eval(&self, x: f64) -> f64 {
        self.scale * self.base.powf(x)
    }
}

/// `a*x^2 + b*x + c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticSegment {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticSegment {
    fn eval(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }
}

/// Daily demand curve of one street in vehicles per hour
///
/// Three fitted pieces over hour of day `x`: exponential growth up to the
/// morning, a quadratic plateau through the day, exponential decay into the
/// night.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrivalCurve {
    pub growth: ExponentialSegment,
    pub growth_end_hour: f64,
    pub plateau: QuadraticSegment,
    pub plateau_end_hour: f64,
    pub decay: ExponentialSegment,
}

impl ArrivalCurve {
    /// Curve fitted to counts on the given street
    pub fn for_street(cardinal: Cardinal) -> Self {
        let (growth, growth_end_hour, plateau, decay) = match cardinal {
            Cardinal::North => ((5.33, 1.44), 7.77, (5.76, -129.5, 726.51), (128_215.48, 0.64)),
            Cardinal::East => ((34.44, 1.45), 7.75, (39.96, -923.21, 5354.93), (124_606.72, 0.71)),
            Cardinal::South => ((50.68, 1.4), 7.95, (38.52, -931.02, 5702.66), (40_255.22, 0.77)),
            Cardinal::West => ((200.0, 1.2), 7.97, (51.08, -1176.09, 6958.85), (38_200.08, 0.79)),
        };
        Self {
            growth: ExponentialSegment {
                scale: growth.0,
                base: growth.1,
            },
            growth_end_hour,
            plateau: QuadraticSegment {
                a: plateau.0,
                b: plateau.1,
                c: plateau.2,
            },
            plateau_end_hour: 15.92,
            decay: ExponentialSegment {
                scale: decay.0,
                base: decay.1,
            },
        }
    }

    /// Expected vehicles per hour at `time_of_day_secs` past midnight
    ///
    /// The quadratic fit dips slightly below zero around midday on the
    /// quietest street; demand is floored at zero.
    pub fn rate_per_hour(&self, time_of_day_secs: f64) -> f64 {
        let x = time_of_day_secs / SECONDS_PER_HOUR;
        let rate = if (0.0..=self.growth_end_hour).contains(&x) {
            self.growth.eval(x)
        } else if x > self.growth_end_hour && x <= self.plateau_end_hour {
            self.plateau.eval(x)
        } else if x > self.plateau_end_hour && x <= 24.0 {
            self.decay.eval(x)
        } else {
            0.0
        };
        rate.max(0.0)
    }
}

/// Poisson probability of exactly `k` events with mean `lambda`
pub fn poisson_pmf(k: usize, lambda: f64) -> f64 {
    let factorial: f64 = (1..=k).map(|i| i as f64).product();
    (-lambda).exp() * lambda.powi(k as i32) / factorial
}

/// Cars added (and turned away) in one spawn round, indexed by [`Cardinal::index`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrivalReport {
    pub spawned: [usize; 4],
    /// Arrivals lost because the lane queue was full
    pub dropped: [usize; 4],
}

impl ArrivalReport {
    pub fn total_spawned(&self) -> usize {
        self.spawned.iter().sum()
    }
}

/// Spawner feeding every street's through/right lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrivalProcess {
    /// Seconds covered by one draw
    pub interval_secs: f64,
    /// Number of spawn-count buckets; draws beyond them yield zero cars
    pub max_spawned: usize,
}

impl Default for ArrivalProcess {
    fn default() -> Self {
        Self {
            interval_secs: SPAWN_INTERVAL_SECS,
            max_spawned: MAX_SPAWNED_CARS,
        }
    }
}

impl ArrivalProcess {
    /// Expected arrivals on `curve` during one interval starting at `time_of_day_secs`
    pub fn expected_arrivals(&self, curve: &ArrivalCurve, time_of_day_secs: f64) -> f64 {
        curve.rate_per_hour(time_of_day_secs) / SECONDS_PER_HOUR * self.interval_secs
    }

    /// Cumulative spawn-count probabilities `P(k' <= k)` for `k in 0..max_spawned`
    pub fn cumulative_table(&self, lambda: f64) -> Vec<f64> {
        (0..self.max_spawned)
            .scan(0.0, |acc, k| {
                *acc += poisson_pmf(k, lambda);
                Some(*acc)
            })
            .collect()
    }

    /// Draw how many cars arrive on a street with one uniform sample
    pub fn sample_count(&self, lambda: f64, rng: &mut SimRng) -> usize {
        let cumulative = self.cumulative_table(lambda);
        rng.sample_cumulative(&cumulative).unwrap_or(0)
    }

    /// Run one spawn round over all streets
    pub fn spawn(
        &self,
        streets: &mut [Street; 4],
        time_of_day_secs: f64,
        rng: &mut SimRng,
    ) -> ArrivalReport {
        let mut report = ArrivalReport::default();

        for street in streets.iter_mut() {
            let lambda = self.expected_arrivals(street.curve(), time_of_day_secs);
            let count = self.sample_count(lambda, rng);
            let idx = street.cardinal().index();

            let lane = street.lane_mut(LaneKind::Through);
            for _ in 0..count {
                if add_car(lane, rng) {
                    report.spawned[idx] += 1;
                } else {
                    report.dropped[idx] += 1;
                }
            }
        }

        if report.dropped.iter().any(|&n| n > 0) {
            warn!(dropped = ?report.dropped, "lane capacity reached, arrivals turned away");
        }

        report
    }
}

/// Where a new car enters `lane`: the spawn point, or just behind a tail
/// that already reaches it, plus random spacing
pub fn spawn_position(lane: &Lane, rng: &mut SimRng) -> f64 {
    let min_gap = CAR_LENGTH + SAFETY_DISTANCE;
    let base = match lane.cars().back() {
        Some(tail) if tail.position > SPAWN_POSITION - min_gap => tail.position + min_gap,
        _ => SPAWN_POSITION,
    };
    base + rng.uniform(0.0, SPAWN_JITTER)
}

/// Enqueue one car at the tail of `lane`; false if the lane is full
pub fn add_car(lane: &mut Lane, rng: &mut SimRng) -> bool {
    let position = spawn_position(lane, rng);
    let car = Car::spawned(lane.kind(), position);
    lane.cars_mut().enqueue(car).is_ok()
}
