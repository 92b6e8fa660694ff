//! Signal phase machine
//!
//! Advances strictly forward through the six-phase cycle. Three kinds of
//! transition exist:
//!
//! - **Automatic**: a yellow phase that has run its full duration moves on
//!   by itself ([`PhaseMachine::expire_yellow`]).
//! - **Requested**: a controller asks to move on ([`PhaseMachine::request_switch`]).
//!   Yellow phases cannot be cut short, and a green phase holds for the
//!   minimum green time unless every lane it serves is empty.
//! - **Forced**: a controller that reaches the maximum green time issues a
//!   request regardless of its own policy; the request rules above still apply.

use crate::core::constants::{
    secs_to_ticks, ticks_to_secs, MIN_GREEN_SECS, YELLOW_SECS, YELLOW_TO_GREEN_ENTRY_SECS,
    YELLOW_TO_RED_ENTRY_SECS,
};
use crate::models::{SignalColor, SignalGroup, SignalPhase};
use serde::{Deserialize, Serialize};

/// Result of a switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched { from: SignalPhase, to: SignalPhase },
    /// Yellow phases run their full duration
    RejectedYellow,
    /// Green has not yet run its minimum time and still serves cars
    RejectedMinGreen,
}

impl SwitchOutcome {
    pub fn switched(&self) -> bool {
        matches!(self, SwitchOutcome::Switched { .. })
    }
}

/// Current phase and the ticks spent in it
///
/// # Example
/// ```
/// use intersection_control_core::{PhaseMachine, SignalPhase};
///
/// let mut machine = PhaseMachine::new(SignalPhase::RedGreen);
/// // Green holds for the minimum time while its lanes have cars
/// assert!(!machine.request_switch(false).switched());
///
/// for _ in 0..130 {
///     machine.advance_tick();
/// }
/// assert!(machine.request_switch(false).switched());
/// assert_eq!(machine.phase(), SignalPhase::RedYellowToRed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMachine {
    phase: SignalPhase,
    elapsed_ticks: u64,
    yellow_ticks: u64,
    min_green_ticks: u64,
}

impl PhaseMachine {
    pub fn new(initial: SignalPhase) -> Self {
        Self {
            phase: initial,
            elapsed_ticks: 0,
            yellow_ticks: secs_to_ticks(YELLOW_SECS),
            min_green_ticks: secs_to_ticks(MIN_GREEN_SECS),
        }
    }

    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Seconds since the last phase change
    pub fn elapsed_secs(&self) -> f64 {
        ticks_to_secs(self.elapsed_ticks)
    }

    pub fn advance_tick(&mut self) {
        self.elapsed_ticks += 1;
    }

    /// Move past a yellow phase that has run its full duration
    pub fn expire_yellow(&mut self) -> bool {
        if self.phase.is_yellow() && self.elapsed_ticks >= self.yellow_ticks {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Jump the timer to the minimum green so a pending switch is not held back
    pub fn waive_min_green(&mut self) {
        self.elapsed_ticks = self.min_green_ticks;
    }

    /// Ask for the next phase
    ///
    /// `served_lanes_empty` tells whether every lane of the active axis is empty.
    pub fn request_switch(&mut self, served_lanes_empty: bool) -> SwitchOutcome {
        if self.phase.is_yellow() && self.elapsed_ticks < self.yellow_ticks {
            return SwitchOutcome::RejectedYellow;
        }
        if self.phase.is_green_dwell()
            && self.elapsed_ticks < self.min_green_ticks
            && !served_lanes_empty
        {
            return SwitchOutcome::RejectedMinGreen;
        }
        let from = self.phase;
        self.advance();
        SwitchOutcome::Switched { from, to: self.phase }
    }

    /// Whether a car of `group` that has not crossed may enter the junction now
    pub fn admits(&self, group: SignalGroup) -> bool {
        match self.phase.color(group) {
            SignalColor::Green => true,
            SignalColor::YellowToGreen => self.elapsed_secs() > YELLOW_TO_GREEN_ENTRY_SECS,
            SignalColor::YellowToRed => self.elapsed_secs() < YELLOW_TO_RED_ENTRY_SECS,
            SignalColor::Red => false,
        }
    }

    fn advance(&mut self) {
        self.phase = self.phase.next();
        self.elapsed_ticks = 0;
    }
}
