//! Flat training data drained from finished episodes.
//!
//! Parallel arrays: entry `i` of each vector describes the same decision.
//! Only decisions whose hands have fully resolved ever land here.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{BlackjackError, BlackjackResult};
use crate::network::{logistic, Matrix};
use crate::policy::{StateVector, NUM_ACTIONS, NUM_FEATURES};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingBuffers {
    pub states: Vec<StateVector>,
    pub probabilities: Vec<Vec<f64>>,
    /// Index of the action actually taken at each decision.
    pub actions: Vec<usize>,
    pub rewards: Vec<f64>,
}

impl TrainingBuffers {
    pub fn new() -> TrainingBuffers {
        TrainingBuffers::default()
    }

    pub fn push(&mut self, state: StateVector, probabilities: Vec<f64>, action: usize, reward: f64) {
        self.states.push(state);
        self.probabilities.push(probabilities);
        self.actions.push(action);
        self.rewards.push(reward);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    pub fn features(&self) -> Matrix {
        Array2::from_shape_fn((self.len(), NUM_FEATURES), |(i, j)| self.states[i][j] as f64)
    }

    /// Targets for the trainer: each recorded output with the taken action's
    /// score replaced by the squashed reward.
    pub fn targets(&self, reward_scale: f64) -> BlackjackResult<Matrix> {
        if reward_scale <= 0.0 {
            return Err(BlackjackError::InvalidValue(format!(
                "Reward scale must be positive, got {}",
                reward_scale
            )));
        }
        let width = self.probabilities.first().map_or(NUM_ACTIONS, Vec::len);
        let mut y = Array2::zeros((self.len(), width));
        for (i, ((probs, &action), &reward)) in self
            .probabilities
            .iter()
            .zip(&self.actions)
            .zip(&self.rewards)
            .enumerate()
        {
            if probs.len() != width || action >= width {
                return Err(BlackjackError::DimensionMismatch {
                    expected: width,
                    got: probs.len().max(action + 1),
                });
            }
            let mut row = y.row_mut(i);
            row.assign(&ArrayView1::from(probs.as_slice()));
            row[action] = logistic(reward / reward_scale)?;
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_replace_only_taken_action() {
        let mut buffers = TrainingBuffers::new();
        buffers.push([0, 0, 12, 12, 10, 0], vec![0.2, 0.4, 0.6], 1, 0.0);
        let targets = buffers.targets(25.0).unwrap();
        assert_eq!(targets, ndarray::array![[0.2, 0.5, 0.6]]);
    }

    #[test]
    fn test_targets_reject_non_positive_scale() {
        let buffers = TrainingBuffers::new();
        assert!(buffers.targets(0.0).is_err());
    }
}
