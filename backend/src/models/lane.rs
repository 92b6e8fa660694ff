//! Lane model

use crate::core::constants::{LEFT_DESPAWN_POSITION, THROUGH_DESPAWN_POSITION};
use crate::models::car::Car;
use crate::models::phase::SignalGroup;
use crate::models::queue::BoundedQueue;
use crate::models::street::Cardinal;
use serde::{Deserialize, Serialize};

/// Lane type within a street
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneKind {
    Left,
    /// Straight ahead or right turn
    Through,
}

impl LaneKind {
    pub const ALL: [LaneKind; 2] = [LaneKind::Left, LaneKind::Through];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One approach lane and its queue of cars
///
/// Invariant: the queue is ordered by position, front car nearest the stop line.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    street: Cardinal,
    kind: LaneKind,
    group: SignalGroup,
    cars: BoundedQueue<Car>,
}

impl Lane {
    pub fn new(street: Cardinal, kind: LaneKind, capacity: usize) -> Self {
        Self {
            street,
            kind,
            group: street.signal_group(kind),
            cars: BoundedQueue::new(capacity),
        }
    }

    pub fn street(&self) -> Cardinal {
        self.street
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn group(&self) -> SignalGroup {
        self.group
    }

    pub fn cars(&self) -> &BoundedQueue<Car> {
        &self.cars
    }

    pub fn cars_mut(&mut self) -> &mut BoundedQueue<Car> {
        &mut self.cars
    }

    pub fn count(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Position at or beyond which a car leaves the model
    pub fn despawn_position(&self) -> f64 {
        match self.kind {
            LaneKind::Left => LEFT_DESPAWN_POSITION,
            LaneKind::Through => THROUGH_DESPAWN_POSITION,
        }
    }
}
