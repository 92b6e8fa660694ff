//! Signal phase table
//!
//! The junction cycles through six phases, three per axis. Each phase fixes a
//! colour for every signal group. Only one axis is active (green or in a
//! yellow transition) at any time.

use serde::{Deserialize, Serialize};

/// Colour shown to a signal group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalColor {
    Red,
    YellowToRed,
    YellowToGreen,
    Green,
}

/// Lanes that share one signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalGroup {
    NorthSouth,
    NorthSouthLeft,
    EastWest,
    EastWestLeft,
}

impl SignalGroup {
    pub const ALL: [SignalGroup; 4] = [
        SignalGroup::NorthSouth,
        SignalGroup::NorthSouthLeft,
        SignalGroup::EastWest,
        SignalGroup::EastWestLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the six cyclic phases, named `<north-south>_<east-west>`
///
/// # Example
/// ```
/// use intersection_control_core::{SignalColor, SignalGroup, SignalPhase};
///
/// let phase = SignalPhase::RedGreen;
/// assert_eq!(phase.color(SignalGroup::EastWest), SignalColor::Green);
/// assert_eq!(phase.next(), SignalPhase::RedYellowToRed);
/// assert_eq!(SignalPhase::RedYellowToRed.next(), SignalPhase::YellowToGreenRed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    YellowToGreenRed,
    GreenRed,
    YellowToRedRed,
    RedYellowToGreen,
    RedGreen,
    RedYellowToRed,
}

use SignalColor::{Green as G, Red as R, YellowToGreen as YG, YellowToRed as YR};

/// Colours per phase, columns in [`SignalGroup::ALL`] order
const PHASE_TABLE: [[SignalColor; 4]; SignalPhase::COUNT] = [
    [YG, R, R, R],
    [G, R, R, R],
    [YR, R, R, R],
    [R, R, YG, R],
    [R, R, G, R],
    [R, R, YR, R],
];

impl SignalPhase {
    pub const COUNT: usize = 6;

    pub const ALL: [SignalPhase; SignalPhase::COUNT] = [
        SignalPhase::YellowToGreenRed,
        SignalPhase::GreenRed,
        SignalPhase::YellowToRedRed,
        SignalPhase::RedYellowToGreen,
        SignalPhase::RedGreen,
        SignalPhase::RedYellowToRed,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Successor in the fixed cycle
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    pub fn color(self, group: SignalGroup) -> SignalColor {
        PHASE_TABLE[self.index()][group.index()]
    }

    /// Any group is in a yellow transition
    pub fn is_yellow(self) -> bool {
        PHASE_TABLE[self.index()]
            .iter()
            .any(|c| matches!(c, SignalColor::YellowToRed | SignalColor::YellowToGreen))
    }

    /// One axis shows a steady green
    pub fn is_green_dwell(self) -> bool {
        matches!(self, SignalPhase::GreenRed | SignalPhase::RedGreen)
    }

    /// True if the north-south axis is the active one
    pub fn north_south_active(self) -> bool {
        self.index() < 3
    }

    /// Through group of the active axis
    pub fn active_group(self) -> SignalGroup {
        if self.north_south_active() {
            SignalGroup::NorthSouth
        } else {
            SignalGroup::EastWest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_axis_active() {
        for phase in SignalPhase::ALL {
            let active: Vec<SignalGroup> = SignalGroup::ALL
                .into_iter()
                .filter(|&g| phase.color(g) != SignalColor::Red)
                .collect();
            assert_eq!(active, vec![phase.active_group()], "phase {:?}", phase);
        }
    }

    #[test]
    fn test_yellow_and_green_partition_cycle() {
        for phase in SignalPhase::ALL {
            assert_ne!(phase.is_yellow(), phase.is_green_dwell());
        }
    }

    #[test]
    fn test_cycle_wraps() {
        let mut phase = SignalPhase::YellowToGreenRed;
        for expected in SignalPhase::ALL.iter().cycle().skip(1).take(12) {
            phase = phase.next();
            assert_eq!(phase, *expected);
        }
    }
}
