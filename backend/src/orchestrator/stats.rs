//! Per-day statistics
//!
//! Wait times are corrected by the free-flow traversal time, so a car that
//! never had to slow down records (close to) zero wait.

use crate::core::constants::{ticks_to_secs, DAILY_SAMPLES};
use crate::models::{Cardinal, LaneKind};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Aggregates for one simulated day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStatistics {
    pub day: usize,

    /// Ticks simulated within this day
    pub ticks_elapsed: u64,

    /// Sum of corrected wait times of departed cars (s)
    pub total_wait_time: f64,

    pub max_wait_time: f64,

    pub cars_passed: u64,

    /// Longest through-lane queue seen right after a spawn round
    pub max_queue_length: usize,

    /// Wait time per `[street][lane]`
    pub lane_wait_time: [[f64; 2]; 4],

    /// Departures per `[street][lane]`
    pub lane_cars_passed: [[u64; 2]; 4],

    /// `total_wait_time` sampled once per simulated minute
    pub accumulated_wait_time: Vec<f64>,

    /// `cars_passed` sampled once per simulated minute
    pub cars_passed_over_time: Vec<u64>,

    /// Arrivals turned away by full lanes
    pub dropped_arrivals: u64,
}

impl DayStatistics {
    pub fn new(day: usize) -> Self {
        Self {
            day,
            ..Default::default()
        }
    }

    /// Account for a car leaving the model
    pub fn record_departure(&mut self, street: Cardinal, lane: LaneKind, wait_time: f64) {
        self.total_wait_time += wait_time;
        self.max_wait_time = self.max_wait_time.max(wait_time);
        self.cars_passed += 1;
        self.lane_wait_time[street.index()][lane.index()] += wait_time;
        self.lane_cars_passed[street.index()][lane.index()] += 1;
    }

    pub fn observe_queue(&mut self, length: usize) {
        self.max_queue_length = self.max_queue_length.max(length);
    }

    /// Append a per-minute sample; samples beyond one day's worth are ignored
    pub fn sample(&mut self) {
        if self.accumulated_wait_time.len() >= DAILY_SAMPLES {
            return;
        }
        self.accumulated_wait_time.push(self.total_wait_time);
        self.cars_passed_over_time.push(self.cars_passed);
    }

    pub fn simulated_secs(&self) -> f64 {
        ticks_to_secs(self.ticks_elapsed)
    }

    /// Mean corrected wait per departed car, `None` before any departure
    pub fn average_wait(&self) -> Option<f64> {
        (self.cars_passed > 0).then(|| self.total_wait_time / self.cars_passed as f64)
    }
}

/// Averages over the completed days of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub days: usize,
    pub cars_passed: u64,
    pub average_wait: f64,
    pub average_max_wait: f64,
    pub max_queue_length: usize,
}

impl RunSummary {
    pub fn from_days(days: &[DayStatistics]) -> Self {
        let cars_passed: u64 = days.iter().map(|d| d.cars_passed).sum();
        let total_wait: f64 = days.iter().map(|d| d.total_wait_time).sum();
        let max_wait_sum: f64 = days.iter().map(|d| d.max_wait_time).sum();
        Self {
            days: days.len(),
            cars_passed,
            average_wait: if cars_passed > 0 { total_wait / cars_passed as f64 } else { 0.0 },
            average_max_wait: if days.is_empty() { 0.0 } else { max_wait_sum / days.len() as f64 },
            max_queue_length: days.iter().map(|d| d.max_queue_length).max().unwrap_or(0),
        }
    }
}

/// Per-minute accumulated wait and cars passed, averaged over `days`
///
/// Days that ended before a sample slot contribute zero to it.
pub fn averaged_series(days: &[DayStatistics]) -> (Vec<f64>, Vec<f64>) {
    let mut wait = vec![0.0; DAILY_SAMPLES];
    let mut cars = vec![0.0; DAILY_SAMPLES];
    if days.is_empty() {
        return (wait, cars);
    }

    for day in days {
        for (slot, value) in wait.iter_mut().zip(&day.accumulated_wait_time) {
            *slot += value;
        }
        for (slot, value) in cars.iter_mut().zip(&day.cars_passed_over_time) {
            *slot += *value as f64;
        }
    }

    let n = days.len() as f64;
    wait.iter_mut().chain(cars.iter_mut()).for_each(|v| *v /= n);
    (wait, cars)
}

/// Write `values` as one comma-terminated row
pub fn write_series_csv<W: Write>(mut writer: W, values: &[f64]) -> io::Result<()> {
    for value in values {
        write!(writer, "{:.6},", value)?;
    }
    writer.flush()
}
