//! Multilayer perceptron with logistic activations.
//!
//! Input batches are row-major: one row per example, one column per feature.
//! Layer `l` maps its inputs through `a · W + b` and the logistic function,
//! where `W` is `inputs x perceptrons` and `b` has one entry per perceptron.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BlackjackError, BlackjackResult};

/// Row-major batch: one row per example.
pub type Matrix = Array2<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// weights[[i, k]] connects input i to perceptron k.
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

impl Layer {
    fn random<R: Rng>(inputs: usize, perceptrons: usize, rng: &mut R) -> Layer {
        let weights = Array2::from_shape_fn((inputs, perceptrons), |_| rng.gen::<f64>() - 0.5);
        let biases = Array1::from_shape_fn(perceptrons, |_| rng.gen::<f64>() - 0.5);
        Layer { weights, biases }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn perceptrons(&self) -> usize {
        self.biases.len()
    }

    /// Weighted input `z = a · W + b` for every row of `a`.
    pub fn weighted_input(&self, a: &Matrix) -> BlackjackResult<Matrix> {
        if a.ncols() != self.inputs() {
            return Err(BlackjackError::DimensionMismatch {
                expected: self.inputs(),
                got: a.ncols(),
            });
        }
        Ok(a.dot(&self.weights) + &self.biases)
    }
}

/// Logistic function `1 / (1 + e^-x)`.
///
/// An exponential that overflows (or a non-finite input) is an error rather
/// than a silently saturated output.
pub fn logistic(x: f64) -> BlackjackResult<f64> {
    let e = (-x).exp();
    if !e.is_finite() {
        return Err(BlackjackError::ArithmeticOverflow(x));
    }
    Ok(1.0 / (1.0 + e))
}

/// First derivative of the logistic function, `e^-x / (1 + e^-x)^2`.
pub fn logistic_derivative(x: f64) -> BlackjackResult<f64> {
    let s = logistic(x)?;
    Ok(s * (1.0 - s))
}

/// Elementwise logistic of a whole matrix.
pub fn activate(z: &Matrix) -> BlackjackResult<Matrix> {
    if let Some(&x) = z.iter().find(|&&x| !(-x).exp().is_finite()) {
        return Err(BlackjackError::ArithmeticOverflow(x));
    }
    Ok(z.mapv(|x| 1.0 / (1.0 + (-x).exp())))
}

/// Elementwise logistic derivative of a whole matrix.
pub fn activate_derivative(z: &Matrix) -> BlackjackResult<Matrix> {
    Ok(activate(z)?.mapv_into(|s| s * (1.0 - s)))
}

/// Sum of squared residuals between predictions and targets.
pub fn cost(predictions: &Matrix, targets: &Matrix) -> BlackjackResult<f64> {
    if predictions.dim() != targets.dim() {
        return Err(BlackjackError::DimensionMismatch {
            expected: predictions.len(),
            got: targets.len(),
        });
    }
    Ok((predictions - targets).mapv(|r| r * r).sum())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilayerPerceptron {
    hidden_layers: Vec<usize>,
    layers: Vec<Layer>,
    /// Sum of squared residuals measured after the last training run.
    pub score: f64,
}

impl MultilayerPerceptron {
    /// An uninitialized network with the given hidden layer sizes.
    pub fn new(hidden_layers: &[usize]) -> MultilayerPerceptron {
        MultilayerPerceptron {
            hidden_layers: hidden_layers.to_vec(),
            layers: Vec::new(),
            score: 0.0,
        }
    }

    /// Assemble an already-initialized network from explicit layers.
    ///
    /// Each layer's input width must equal the previous layer's perceptron
    /// count, and every layer's weight columns must match its bias count.
    pub fn from_layers(layers: Vec<Layer>) -> BlackjackResult<MultilayerPerceptron> {
        if layers.is_empty() {
            return Err(BlackjackError::InvalidDimension("network has no layers".to_string()));
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.inputs() == 0 || layer.perceptrons() == 0 {
                return Err(BlackjackError::InvalidDimension(format!("layer {} is empty", i)));
            }
            if layer.weights.ncols() != layer.perceptrons() {
                return Err(BlackjackError::DimensionMismatch {
                    expected: layer.perceptrons(),
                    got: layer.weights.ncols(),
                });
            }
            if i > 0 && layers[i - 1].perceptrons() != layer.inputs() {
                return Err(BlackjackError::DimensionMismatch {
                    expected: layers[i - 1].perceptrons(),
                    got: layer.inputs(),
                });
            }
        }
        let hidden_layers = layers[..layers.len() - 1].iter().map(Layer::perceptrons).collect();
        Ok(MultilayerPerceptron {
            hidden_layers,
            layers,
            score: 0.0,
        })
    }

    /// Re-check the layer shapes of a network that came from outside,
    /// e.g. a deserialized snapshot.
    pub fn validate(&self) -> BlackjackResult<()> {
        if !self.is_initialized() {
            return Err(BlackjackError::NetworkNotInitialized);
        }
        let rebuilt = MultilayerPerceptron::from_layers(self.layers.clone())?;
        if rebuilt.hidden_layers != self.hidden_layers {
            return Err(BlackjackError::InvalidDimension(format!(
                "hidden layers {:?} do not match layer shapes {:?}",
                self.hidden_layers, rebuilt.hidden_layers
            )));
        }
        Ok(())
    }

    pub fn hidden_layers(&self) -> &[usize] {
        &self.hidden_layers
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn is_initialized(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn num_features(&self) -> Option<usize> {
        self.layers.first().map(Layer::inputs)
    }

    pub fn num_targets(&self) -> Option<usize> {
        self.layers.last().map(Layer::perceptrons)
    }

    /// Replace every layer with fresh weights and biases drawn from [-0.5, 0.5).
    pub fn initialize<R: Rng>(
        &mut self,
        num_features: usize,
        num_targets: usize,
        rng: &mut R,
    ) -> BlackjackResult<()> {
        if num_features == 0 || num_targets == 0 {
            return Err(BlackjackError::InvalidDimension(format!(
                "{} features, {} targets",
                num_features, num_targets
            )));
        }
        if let Some(pos) = self.hidden_layers.iter().position(|&n| n == 0) {
            return Err(BlackjackError::InvalidDimension(format!(
                "hidden layer {} has no perceptrons",
                pos
            )));
        }
        let mut layers = Vec::with_capacity(self.hidden_layers.len() + 1);
        let mut inputs = num_features;
        for &perceptrons in &self.hidden_layers {
            layers.push(Layer::random(inputs, perceptrons, rng));
            inputs = perceptrons;
        }
        layers.push(Layer::random(inputs, num_targets, rng));
        self.layers = layers;
        Ok(())
    }

    /// Output-layer activations for every row of `batch`.
    pub fn forward(&self, batch: &Matrix) -> BlackjackResult<Matrix> {
        if !self.is_initialized() {
            return Err(BlackjackError::NetworkNotInitialized);
        }
        let mut a = batch.clone();
        for layer in &self.layers {
            a = activate(&layer.weighted_input(&a)?)?;
        }
        Ok(a)
    }

    /// Forward pass that keeps every layer's activations and weighted inputs.
    ///
    /// `activations[0]` is the batch itself, so `activations.len()` is one more
    /// than `weighted_inputs.len()`.
    pub fn forward_cached(&self, batch: &Matrix) -> BlackjackResult<(Vec<Matrix>, Vec<Matrix>)> {
        if !self.is_initialized() {
            return Err(BlackjackError::NetworkNotInitialized);
        }
        let mut activations = vec![batch.clone()];
        let mut weighted_inputs = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let z = layer.weighted_input(&activations[activations.len() - 1])?;
            activations.push(activate(&z)?);
            weighted_inputs.push(z);
        }
        Ok((activations, weighted_inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_midpoint() {
        assert_eq!(logistic(0.0).unwrap(), 0.5);
        assert_eq!(logistic_derivative(0.0).unwrap(), 0.25);
    }

    #[test]
    fn test_logistic_overflow_is_an_error() {
        assert!(matches!(logistic(-1000.0), Err(BlackjackError::ArithmeticOverflow(_))));
        assert!(logistic(1000.0).is_ok());
        assert!(logistic(f64::NAN).is_err());
    }

    #[test]
    fn test_activate_matches_scalar_logistic() {
        let z = ndarray::array![[0.0, 2.0], [-3.0, 0.5]];
        let a = activate(&z).unwrap();
        for (&x, &y) in z.iter().zip(a.iter()) {
            assert_eq!(y, logistic(x).unwrap());
        }
        assert!(activate(&ndarray::array![[0.0, -1000.0]]).is_err());
    }

    #[test]
    fn test_cost_is_sum_of_squares() {
        let p = ndarray::array![[1.0, 0.0], [0.5, 0.5]];
        let t = ndarray::array![[0.0, 0.0], [0.5, 1.5]];
        assert_eq!(cost(&p, &t).unwrap(), 2.0);
        assert!(cost(&p, &ndarray::array![[0.0, 0.0]]).is_err());
    }
}
