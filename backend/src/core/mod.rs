//! Time management and fixed model parameters

pub mod clock;
pub mod constants;
