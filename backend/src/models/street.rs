//! Street model
//!
//! Four streets meet at the junction, one per compass direction. Each has a
//! left-turn lane and a through/right lane, and its own time-of-day arrival
//! curve.

use crate::arrivals::ArrivalCurve;
use crate::models::lane::{Lane, LaneKind};
use crate::models::phase::SignalGroup;
use serde::{Deserialize, Serialize};

/// Compass identity of a street approach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Cardinal::North => "Kjellerupsgade",
            Cardinal::East => "Fyensgade",
            Cardinal::South => "Soenderbro",
            Cardinal::West => "Jyllandsgade",
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    pub fn is_north_south(self) -> bool {
        matches!(self, Cardinal::North | Cardinal::South)
    }

    /// Signal group controlling the given lane of this street
    pub fn signal_group(self, kind: LaneKind) -> SignalGroup {
        match (self.is_north_south(), kind) {
            (true, LaneKind::Through) => SignalGroup::NorthSouth,
            (true, LaneKind::Left) => SignalGroup::NorthSouthLeft,
            (false, LaneKind::Through) => SignalGroup::EastWest,
            (false, LaneKind::Left) => SignalGroup::EastWestLeft,
        }
    }
}

/// A street approach with its two lanes
#[derive(Debug, Clone, PartialEq)]
pub struct Street {
    cardinal: Cardinal,
    lanes: [Lane; 2],
    curve: ArrivalCurve,
}

impl Street {
    pub fn new(cardinal: Cardinal, lane_capacity: usize) -> Self {
        Self {
            cardinal,
            lanes: LaneKind::ALL.map(|kind| Lane::new(cardinal, kind, lane_capacity)),
            curve: ArrivalCurve::for_street(cardinal),
        }
    }

    pub fn cardinal(&self) -> Cardinal {
        self.cardinal
    }

    pub fn name(&self) -> &'static str {
        self.cardinal.name()
    }

    pub fn lane(&self, kind: LaneKind) -> &Lane {
        &self.lanes[kind.index()]
    }

    pub fn lane_mut(&mut self, kind: LaneKind) -> &mut Lane {
        &mut self.lanes[kind.index()]
    }

    pub fn lanes(&self) -> &[Lane; 2] {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut [Lane; 2] {
        &mut self.lanes
    }

    pub fn curve(&self) -> &ArrivalCurve {
        &self.curve
    }

    /// Cars queued in both lanes
    pub fn car_count(&self) -> usize {
        self.lanes.iter().map(Lane::count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites() {
        assert_eq!(Cardinal::North.opposite(), Cardinal::South);
        assert_eq!(Cardinal::East.opposite(), Cardinal::West);
        assert_eq!(Cardinal::West.opposite(), Cardinal::East);
    }

    #[test]
    fn test_lane_groups() {
        let street = Street::new(Cardinal::West, 10);
        assert_eq!(street.lane(LaneKind::Through).group(), SignalGroup::EastWest);
        assert_eq!(street.lane(LaneKind::Left).group(), SignalGroup::EastWestLeft);
        assert_eq!(street.lane(LaneKind::Left).kind(), LaneKind::Left);
    }
}
