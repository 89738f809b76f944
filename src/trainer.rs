//! Mini-batch stochastic gradient descent for [`MultilayerPerceptron`].
//!
//! Loss is the sum of squared residuals; its gradient with respect to the
//! output activations is `2 * (prediction - target)`. Gradients flow back
//! through the logistic derivative layer by layer, and each layer's weights
//! are updated only after the next layer down has taken its gradient.

use std::fmt;
use std::time::{Duration, Instant};

use ndarray::Axis;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BlackjackError, BlackjackResult};
use crate::network::{activate_derivative, cost, Matrix, MultilayerPerceptron};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Stop once the L2 norm of an epoch's output gradients is at or below this.
    pub convergence_threshold: f64,
    pub max_epochs: usize,
    #[serde(with = "seconds")]
    pub max_time: Duration,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            batch_size: 10,
            learning_rate: 1.0,
            convergence_threshold: 0.0,
            max_epochs: 10,
            max_time: Duration::from_secs(60),
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxTime,
    MaxEpochs,
    Converged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxTime => write!(f, "maximum runtime encountered"),
            StopReason::MaxEpochs => write!(f, "maximum epoch encountered"),
            StopReason::Converged => write!(f, "convergence achieved"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: usize,
    pub stop: StopReason,
    /// Sum of squared residuals over the full dataset after training.
    pub score: f64,
    /// L2 norm of the output gradients accumulated over the final epoch.
    pub gradient_norm: f64,
    pub elapsed: Duration,
}

/// Re-initialize `network` for the shape of `x`/`y` and fit it by SGD.
pub fn train<R: Rng>(
    network: &mut MultilayerPerceptron,
    x: &Matrix,
    y: &Matrix,
    config: &TrainConfig,
    rng: &mut R,
) -> BlackjackResult<TrainReport> {
    if x.nrows() != y.nrows() {
        return Err(BlackjackError::DimensionMismatch {
            expected: x.nrows(),
            got: y.nrows(),
        });
    }
    if config.batch_size == 0 {
        return Err(BlackjackError::InvalidValue("Batch size must be positive".to_string()));
    }
    if x.nrows() < config.batch_size {
        return Err(BlackjackError::InsufficientExamples {
            batch_size: config.batch_size,
            got: x.nrows(),
        });
    }
    let num_features = x.ncols();
    let num_targets = y.ncols();

    network.initialize(num_features, num_targets, rng)?;

    let start = Instant::now();
    let mut order: Vec<usize> = (0..x.nrows()).collect();
    let mut epoch = 1;
    let (stop, gradient_norm) = loop {
        order.shuffle(rng);
        let mut total_gradient = 0.0;
        for chunk in order.chunks(config.batch_size) {
            let batch_x = x.select(Axis(0), chunk);
            let batch_y = y.select(Axis(0), chunk);
            total_gradient += step(network, &batch_x, &batch_y, config.learning_rate)?;
        }
        epoch += 1;
        let norm = total_gradient.sqrt();
        log::debug!("epoch {:>6}  gradient norm {:.6}", epoch - 1, norm);
        if start.elapsed() > config.max_time {
            break (StopReason::MaxTime, norm);
        }
        if epoch > config.max_epochs {
            break (StopReason::MaxEpochs, norm);
        }
        if norm <= config.convergence_threshold {
            break (StopReason::Converged, norm);
        }
    };

    let score = score(network, x, y)?;
    network.score = score;
    let report = TrainReport {
        epochs: epoch - 1,
        stop,
        score,
        gradient_norm,
        elapsed: start.elapsed(),
    };
    log::info!(
        "training stopped after {} epochs ({}), score {:.4}",
        report.epochs,
        report.stop,
        report.score
    );
    Ok(report)
}

/// Sum of squared residuals of the network's predictions over `x`.
pub fn score(network: &MultilayerPerceptron, x: &Matrix, y: &Matrix) -> BlackjackResult<f64> {
    let predictions = network.forward(x)?;
    cost(&predictions, y)
}

/// One forward/backward pass over a batch. Returns the squared Frobenius
/// norm of the output gradient for convergence tracking.
fn step(
    network: &mut MultilayerPerceptron,
    batch_x: &Matrix,
    batch_y: &Matrix,
    learning_rate: f64,
) -> BlackjackResult<f64> {
    let (activations, weighted_inputs) = network.forward_cached(batch_x)?;
    let output = &activations[activations.len() - 1];

    let grad_a: Matrix = (output - batch_y) * 2.0;
    let grad_norm_sq = grad_a.mapv(|g| g * g).sum();

    let output_layer = weighted_inputs.len() - 1;
    let mut grad_z = activate_derivative(&weighted_inputs[output_layer])? * &grad_a;
    let scale = learning_rate / batch_x.nrows() as f64;

    for current in (0..=output_layer).rev() {
        let grad_w = activations[current].t().dot(&grad_z);
        let grad_b = grad_z.sum_axis(Axis(0));
        // The next layer down needs this layer's weights as they were before the update.
        let next_grad_z = if current > 0 {
            let back = grad_z.dot(&network.layers()[current].weights.t());
            Some(activate_derivative(&weighted_inputs[current - 1])? * &back)
        } else {
            None
        };

        let layer = &mut network.layers_mut()[current];
        layer.weights.scaled_add(-scale, &grad_w);
        layer.biases.scaled_add(-scale, &grad_b);

        match next_grad_z {
            Some(g) => grad_z = g,
            None => break,
        }
    }
    Ok(grad_norm_sq)
}
