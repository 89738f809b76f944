use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use blackjack_rl::error::BlackjackError;
use blackjack_rl::network::*;

#[test]
fn test_uninitialized_network_refuses_forward() {
    let network = MultilayerPerceptron::new(&[4]);
    assert!(!network.is_initialized());
    assert!(matches!(
        network.forward(&array![[1.0, 2.0]]),
        Err(BlackjackError::NetworkNotInitialized)
    ));
}

#[test]
fn test_initialize_builds_layer_shapes() {
    let mut network = MultilayerPerceptron::new(&[30, 8]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(1)).unwrap();
    let shapes: Vec<(usize, usize)> = network.layers().iter().map(|l| (l.inputs(), l.perceptrons())).collect();
    assert_eq!(shapes, vec![(6, 30), (30, 8), (8, 5)]);
    assert_eq!(network.num_features(), Some(6));
    assert_eq!(network.num_targets(), Some(5));
}

#[test]
fn test_initial_weights_in_range() {
    let mut network = MultilayerPerceptron::new(&[10]);
    network.initialize(3, 2, &mut StdRng::seed_from_u64(9)).unwrap();
    for layer in network.layers() {
        for w in layer.weights.iter().chain(layer.biases.iter()) {
            assert!((-0.5..0.5).contains(w));
        }
    }
}

#[test]
fn test_initialize_rejects_empty_dimensions() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(MultilayerPerceptron::new(&[4]).initialize(0, 5, &mut rng).is_err());
    assert!(MultilayerPerceptron::new(&[4]).initialize(6, 0, &mut rng).is_err());
    assert!(matches!(
        MultilayerPerceptron::new(&[4, 0]).initialize(6, 5, &mut rng),
        Err(BlackjackError::InvalidDimension(_))
    ));
}

#[test]
fn test_no_hidden_layers_is_a_single_layer() {
    let mut network = MultilayerPerceptron::new(&[]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(network.layers().len(), 1);
}

#[test]
fn test_forward_is_repeatable() {
    let batch = array![[0.0, 1.0, 12.0, 12.0, 10.0, 0.0]];
    let mut network = MultilayerPerceptron::new(&[30]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    let first = network.forward(&batch).unwrap();
    let second = network.forward(&batch).unwrap();
    let bits = |m: &Array2<f64>| m.iter().map(|v| v.to_bits()).collect::<Vec<u64>>();
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_initialize_is_deterministic_for_a_seed() {
    let mut a = MultilayerPerceptron::new(&[30]);
    let mut b = MultilayerPerceptron::new(&[30]);
    a.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    b.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(a.layers(), b.layers());
}

#[test]
fn test_forward_outputs_are_probabilities() {
    let mut network = MultilayerPerceptron::new(&[30]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    let batch = array![[1.0, 0.0, 16.0, 16.0, 6.0, 0.0]];
    let out = network.forward(&batch.broadcast((3, 6)).unwrap().to_owned()).unwrap();
    assert_eq!(out.dim(), (3, 5));
    for row in out.rows() {
        assert!(row.iter().all(|&p| p > 0.0 && p < 1.0));
    }
}

#[test]
fn test_forward_rejects_wrong_width() {
    let mut network = MultilayerPerceptron::new(&[4]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    assert!(matches!(
        network.forward(&array![[1.0, 2.0]]),
        Err(BlackjackError::DimensionMismatch { expected: 6, got: 2 })
    ));
}

#[test]
fn test_forward_cached_keeps_every_layer() {
    let mut network = MultilayerPerceptron::new(&[4, 3]);
    network.initialize(2, 1, &mut StdRng::seed_from_u64(5)).unwrap();
    let batch = array![[0.5, -0.5]];
    let (activations, weighted) = network.forward_cached(&batch).unwrap();
    assert_eq!(activations.len(), 4);
    assert_eq!(weighted.len(), 3);
    assert_eq!(activations[0], batch);
    assert_eq!(activations[3], network.forward(&batch).unwrap());
}

#[test]
fn test_from_layers_computes_logistic_of_affine() {
    let layer = Layer {
        weights: array![[1.0], [-2.0]],
        biases: array![0.5],
    };
    let network = MultilayerPerceptron::from_layers(vec![layer]).unwrap();
    let out = network.forward(&array![[1.0, 1.0]]).unwrap();
    assert_relative_eq!(out[[0, 0]], 1.0 / (1.0 + (0.5f64).exp()), epsilon = 1e-12);
    assert!(network.hidden_layers().is_empty());
}

#[test]
fn test_from_layers_rejects_mismatched_chain() {
    let first = Layer {
        weights: Array2::zeros((2, 3)),
        biases: Array1::zeros(3),
    };
    let second = Layer {
        weights: Array2::zeros((4, 1)),
        biases: Array1::zeros(1),
    };
    assert!(matches!(
        MultilayerPerceptron::from_layers(vec![first, second]),
        Err(BlackjackError::DimensionMismatch { expected: 3, got: 4 })
    ));
    assert!(MultilayerPerceptron::from_layers(Vec::new()).is_err());
}

#[test]
fn test_validate_catches_tampered_hidden_layers() {
    let mut network = MultilayerPerceptron::new(&[4]);
    network.initialize(6, 5, &mut StdRng::seed_from_u64(5)).unwrap();
    assert!(network.validate().is_ok());
    let json = serde_json::to_string(&network).unwrap().replace("\"hidden_layers\":[4]", "\"hidden_layers\":[7]");
    let tampered: MultilayerPerceptron = serde_json::from_str(&json).unwrap();
    assert!(tampered.validate().is_err());
}

#[test]
fn test_cost_of_perfect_prediction_is_zero() {
    let m = array![[0.25, 0.75]];
    assert_relative_eq!(cost(&m, &m).unwrap(), 0.0);
}
