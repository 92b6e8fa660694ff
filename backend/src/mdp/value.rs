//! Value table over the discrete state space

use crate::mdp::state::{DiscreteState, STATE_COUNT};
use crate::mdp::MdpError;

/// One value per discrete state, in index order
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    values: Vec<f64>,
}

impl ValueTable {
    /// `V_0`
    pub fn zeros() -> Self {
        Self {
            values: vec![0.0; STATE_COUNT],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Result<Self, MdpError> {
        if values.len() != STATE_COUNT {
            return Err(MdpError::TableSize {
                expected: STATE_COUNT,
                found: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn get(&self, state: &DiscreteState) -> f64 {
        self.values[state.to_index()]
    }

    pub fn get_index(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Largest absolute entry-wise difference
    pub fn max_abs_diff(&self, other: &ValueTable) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}
