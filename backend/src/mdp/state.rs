//! Discrete state abstraction
//!
//! A state is the 6-tuple (car bin N, S, E, W, phase, time bin). The linear
//! index enumerates it in that nesting order, time bin innermost, and is the
//! single ordering shared by the solver, the value files and the controller.

use crate::core::constants::ticks_to_secs;
use crate::mdp::MdpError;
use crate::models::{Cardinal, LaneKind, SignalPhase};
use crate::orchestrator::Intersection;
use serde::{Deserialize, Serialize};

/// Inclusive car-count ranges per bin
pub const CAR_BIN_BOUNDS: [(usize, usize); 6] =
    [(0, 0), (1, 3), (4, 8), (9, 15), (16, 25), (26, 126)];

/// Inclusive whole-second ranges of phase elapsed time per bin
pub const TIME_BIN_BOUNDS: [(u64, u64); 3] = [(0, 15), (16, 119), (120, 10_000)];

pub const CAR_BINS: usize = CAR_BIN_BOUNDS.len();
pub const TIME_BINS: usize = TIME_BIN_BOUNDS.len();
pub const DIRECTIONS: usize = 4;

/// Size of the discrete state space
pub const STATE_COUNT: usize =
    CAR_BINS * CAR_BINS * CAR_BINS * CAR_BINS * SignalPhase::COUNT * TIME_BINS;

/// Approach direction in state order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; DIRECTIONS] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Self, MdpError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(MdpError::DirectionOutOfRange { index })
    }

    pub fn cardinal(self) -> Cardinal {
        match self {
            Direction::North => Cardinal::North,
            Direction::South => Cardinal::South,
            Direction::East => Cardinal::East,
            Direction::West => Cardinal::West,
        }
    }

    pub fn is_north_south(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

/// Car-count bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarBin(usize);

impl CarBin {
    pub const EMPTY: CarBin = CarBin(0);

    pub fn new(index: usize) -> Option<Self> {
        (index < CAR_BINS).then_some(CarBin(index))
    }

    /// Counts past the last bound saturate into the top bin
    pub fn from_count(count: usize) -> Self {
        let index = CAR_BIN_BOUNDS
            .iter()
            .position(|&(_, hi)| count <= hi)
            .unwrap_or(CAR_BINS - 1);
        CarBin(index)
    }

    pub(crate) fn from_index_unchecked(index: usize) -> Self {
        debug_assert!(index < CAR_BINS);
        CarBin(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn bounds(self) -> (usize, usize) {
        CAR_BIN_BOUNDS[self.0]
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Phase elapsed-time bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBin(usize);

impl TimeBin {
    pub const FIRST: TimeBin = TimeBin(0);
    pub const TERMINAL: TimeBin = TimeBin(TIME_BINS - 1);

    pub fn new(index: usize) -> Option<Self> {
        (index < TIME_BINS).then_some(TimeBin(index))
    }

    /// Bin of an elapsed time, truncated to whole seconds
    pub fn from_secs(secs: f64) -> Self {
        let whole = secs.max(0.0) as u64;
        let index = TIME_BIN_BOUNDS
            .iter()
            .position(|&(_, hi)| whole <= hi)
            .unwrap_or(TIME_BINS - 1);
        TimeBin(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Whole seconds covered by this bin
    pub fn width(self) -> u64 {
        let (lo, hi) = TIME_BIN_BOUNDS[self.0];
        hi - lo + 1
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

/// One point of the discrete state space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteState {
    /// Indexed by [`Direction::index`]
    pub cars: [CarBin; DIRECTIONS],
    pub phase: SignalPhase,
    pub time: TimeBin,
}

impl DiscreteState {
    pub fn car_bin(&self, direction: Direction) -> CarBin {
        self.cars[direction.index()]
    }

    /// Linear index in enumeration order
    ///
    /// # Example
    /// ```
    /// use intersection_control_core::mdp::{DiscreteState, STATE_COUNT};
    ///
    /// let last = DiscreteState::from_index(STATE_COUNT - 1).unwrap();
    /// assert_eq!(last.to_index(), STATE_COUNT - 1);
    /// assert!(DiscreteState::from_index(STATE_COUNT).is_err());
    /// ```
    pub fn to_index(&self) -> usize {
        let mut index = 0;
        for bin in self.cars {
            index = index * CAR_BINS + bin.index();
        }
        index = index * SignalPhase::COUNT + self.phase.index();
        index * TIME_BINS + self.time.index()
    }

    pub fn from_index(index: usize) -> Result<Self, MdpError> {
        if index >= STATE_COUNT {
            return Err(MdpError::StateIndexOutOfRange { index });
        }
        Ok(Self::from_index_unchecked(index))
    }

    /// Caller guarantees `index < STATE_COUNT`
    pub(crate) fn from_index_unchecked(mut index: usize) -> Self {
        let time = TimeBin(index % TIME_BINS);
        index /= TIME_BINS;
        let phase = SignalPhase::ALL[index % SignalPhase::COUNT];
        index /= SignalPhase::COUNT;

        let mut cars = [CarBin::EMPTY; DIRECTIONS];
        for slot in cars.iter_mut().rev() {
            *slot = CarBin(index % CAR_BINS);
            index /= CAR_BINS;
        }

        Self { cars, phase, time }
    }

    /// Observe the through lanes, phase and phase timer of a running junction
    pub fn observe(intersection: &Intersection) -> Self {
        let cars = Direction::ALL.map(|d| {
            CarBin::from_count(intersection.lane(d.cardinal(), LaneKind::Through).count())
        });
        let elapsed = ticks_to_secs(intersection.phase_machine().elapsed_ticks());
        Self {
            cars,
            phase: intersection.phase(),
            time: TimeBin::from_secs(elapsed),
        }
    }
}

/// Iterator over every state in index order
#[derive(Debug, Clone, Default)]
pub struct StateSpace {
    next: usize,
}

impl StateSpace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for StateSpace {
    type Item = DiscreteState;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= STATE_COUNT {
            return None;
        }
        let state = DiscreteState::from_index_unchecked(self.next);
        self.next += 1;
        Some(state)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = STATE_COUNT - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StateSpace {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_state_count() {
        assert_eq!(STATE_COUNT, 23_328);
        assert_eq!(StateSpace::new().len(), STATE_COUNT);
    }

    #[test]
    fn test_car_bins() {
        assert_eq!(CarBin::from_count(0).index(), 0);
        assert_eq!(CarBin::from_count(3).index(), 1);
        assert_eq!(CarBin::from_count(4).index(), 2);
        assert_eq!(CarBin::from_count(25).index(), 4);
        assert_eq!(CarBin::from_count(26).index(), 5);
        assert_eq!(CarBin::from_count(190).index(), 5);
    }

    #[test]
    fn test_time_bins() {
        assert_eq!(TimeBin::from_secs(15.9).index(), 0);
        assert_eq!(TimeBin::from_secs(16.0).index(), 1);
        assert_eq!(TimeBin::from_secs(120.0), TimeBin::TERMINAL);
        assert_eq!(TimeBin::FIRST.width(), 16);
        assert_eq!(TimeBin::TERMINAL.next(), None);
    }

    #[test]
    fn test_enumeration_order() {
        let mut space = StateSpace::new();
        let first = space.next().unwrap();
        let second = space.next().unwrap();
        assert_eq!(first.time.index(), 0);
        assert_eq!(second.time.index(), 1);
        assert_eq!(second.phase, first.phase);

        // North is the outermost loop
        let north_step = DiscreteState::from_index(STATE_COUNT / CAR_BINS).unwrap();
        assert_eq!(north_step.car_bin(Direction::North).index(), 1);
        assert_eq!(north_step.car_bin(Direction::West).index(), 0);
    }

    #[test]
    fn test_direction_out_of_range() {
        assert!(matches!(
            Direction::from_index(4),
            Err(MdpError::DirectionOutOfRange { index: 4 })
        ));
    }

    proptest! {
        #[test]
        fn prop_index_bijection(index in 0usize..STATE_COUNT) {
            let state = DiscreteState::from_index(index).unwrap();
            prop_assert_eq!(state.to_index(), index);
        }
    }
}
