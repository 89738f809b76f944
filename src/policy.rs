//! Maps table observations onto the network and network outputs onto actions.

use std::fmt;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Hand};
use crate::error::{BlackjackError, BlackjackResult};
use crate::network::{Matrix, MultilayerPerceptron};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

/// Network output index order.
pub const ACTIONS: [Action; 5] = [
    Action::Hit,
    Action::Stand,
    Action::Double,
    Action::Split,
    Action::Surrender,
];

pub const NUM_ACTIONS: usize = ACTIONS.len();

impl Action {
    pub fn index(self) -> usize {
        match self {
            Action::Hit => 0,
            Action::Stand => 1,
            Action::Double => 2,
            Action::Split => 3,
            Action::Surrender => 4,
        }
    }

    pub fn from_index(index: usize) -> BlackjackResult<Action> {
        ACTIONS
            .get(index)
            .copied()
            .ok_or_else(|| BlackjackError::InvalidAction(format!("index {}", index)))
    }

    /// Accepts the table shorthand (h, s, d, y, sur) or the full name.
    pub fn parse(text: &str) -> BlackjackResult<Action> {
        match text.trim().to_lowercase().as_str() {
            "h" | "hit" => Ok(Action::Hit),
            "s" | "stand" => Ok(Action::Stand),
            "d" | "double" => Ok(Action::Double),
            "y" | "split" => Ok(Action::Split),
            "sur" | "surrender" => Ok(Action::Surrender),
            other => Err(BlackjackError::InvalidAction(other.to_string())),
        }
    }

    pub fn shorthand(self) -> &'static str {
        match self {
            Action::Hit => "h",
            Action::Stand => "s",
            Action::Double => "d",
            Action::Split => "y",
            Action::Surrender => "sur",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double",
            Action::Split => "split",
            Action::Surrender => "surrender",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

pub const NUM_FEATURES: usize = 6;

/// `[is_pair, has_soft_ace, hand_min, hand_max, upcard, insurance]`.
pub type StateVector = [i32; NUM_FEATURES];

pub fn observe(hand: &Hand, upcard: Card, insurance: bool) -> StateVector {
    [
        hand.is_pair() as i32,
        hand.is_soft() as i32,
        hand.min_value() as i32,
        hand.max_value() as i32,
        upcard.value() as i32,
        insurance as i32,
    ]
}

/// A one-row batch holding `state`.
pub fn state_row(state: &StateVector) -> Matrix {
    Array2::from_shape_fn((1, NUM_FEATURES), |(_, j)| state[j] as f64)
}

/// First index holding the maximum; NaN never wins.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Network output for one decision, kept for the episode record.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub index: usize,
    pub probabilities: Vec<f64>,
}

impl Decision {
    pub fn action(&self) -> BlackjackResult<Action> {
        Action::from_index(self.index)
    }
}

/// Read-only view of an initialized network used for acting.
pub struct QPolicy<'a> {
    network: &'a MultilayerPerceptron,
}

impl<'a> QPolicy<'a> {
    pub fn new(network: &'a MultilayerPerceptron) -> BlackjackResult<QPolicy<'a>> {
        if !network.is_initialized() {
            return Err(BlackjackError::NetworkNotInitialized);
        }
        if network.num_targets() != Some(NUM_ACTIONS) {
            return Err(BlackjackError::DimensionMismatch {
                expected: NUM_ACTIONS,
                got: network.num_targets().unwrap_or(0),
            });
        }
        Ok(QPolicy { network })
    }

    pub fn probabilities(&self, state: &StateVector) -> BlackjackResult<Vec<f64>> {
        let output = self.network.forward(&state_row(state))?;
        Ok(output.row(0).to_vec())
    }

    pub fn select_action(&self, state: &StateVector) -> BlackjackResult<Decision> {
        let probabilities = self.probabilities(state)?;
        let index = argmax(&probabilities).ok_or_else(|| {
            BlackjackError::InvariantViolation("network produced no comparable output".to_string())
        })?;
        Ok(Decision { index, probabilities })
    }

    /// Insurance is bought when the hit score beats the stand score; a tie
    /// is settled by a fair coin. The returned decision records hit for
    /// "buy" and stand for "decline".
    pub fn insurance<R: Rng>(&self, state: &StateVector, rng: &mut R) -> BlackjackResult<Decision> {
        let probabilities = self.probabilities(state)?;
        let accept = probabilities[Action::Hit.index()];
        let decline = probabilities[Action::Stand.index()];
        let buy = if accept == decline { rng.gen_bool(0.5) } else { accept > decline };
        let index = if buy { Action::Hit.index() } else { Action::Stand.index() };
        Ok(Decision { index, probabilities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_action_shorthand_round_trip() {
        for action in ACTIONS {
            assert_eq!(Action::parse(action.shorthand()).unwrap(), action);
        }
        assert!(Action::parse("fold").is_err());
    }
}
