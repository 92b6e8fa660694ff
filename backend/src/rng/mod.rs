//! Deterministic random number generation
//!
//! Every random draw in the simulation (spawn counts, spawn jitter) goes
//! through [`SimRng`], so a seed fully determines a run.

mod xorshift;

pub use xorshift::SimRng;
