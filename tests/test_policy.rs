use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use blackjack_rl::cards::{parse_card, parse_cards, Hand};
use blackjack_rl::error::BlackjackError;
use blackjack_rl::network::{Layer, MultilayerPerceptron};
use blackjack_rl::policy::*;

/// A network whose output ignores the input: logistic of the given biases.
fn constant_network(biases: [f64; NUM_ACTIONS]) -> MultilayerPerceptron {
    MultilayerPerceptron::from_layers(vec![Layer {
        weights: Array2::zeros((NUM_FEATURES, NUM_ACTIONS)),
        biases: Array1::from(biases.to_vec()),
    }])
    .unwrap()
}

#[test]
fn test_policy_rejects_uninitialized_network() {
    let network = MultilayerPerceptron::new(&[30]);
    assert!(matches!(QPolicy::new(&network), Err(BlackjackError::NetworkNotInitialized)));
}

#[test]
fn test_policy_rejects_wrong_output_width() {
    let mut network = MultilayerPerceptron::new(&[30]);
    network.initialize(NUM_FEATURES, 3, &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(matches!(
        QPolicy::new(&network),
        Err(BlackjackError::DimensionMismatch { expected: 5, got: 3 })
    ));
}

#[test]
fn test_observe_builds_state_vector() {
    let hand = Hand::with_cards(0, 10, &parse_cards("As6d").unwrap());
    let upcard = parse_card("Tc").unwrap();
    assert_eq!(observe(&hand, upcard, false), [0, 1, 7, 17, 10, 0]);
    assert_eq!(observe(&hand, upcard, true)[5], 1);

    let pair = Hand::with_cards(0, 10, &parse_cards("8s8d").unwrap());
    assert_eq!(observe(&pair, parse_card("Ah").unwrap(), false), [1, 0, 16, 16, 11, 0]);
}

#[test]
fn test_select_action_takes_argmax() {
    let network = constant_network([0.0, 0.0, 3.0, 0.0, 0.0]);
    let policy = QPolicy::new(&network).unwrap();
    let decision = policy.select_action(&[0, 0, 10, 10, 5, 0]).unwrap();
    assert_eq!(decision.index, 2);
    assert_eq!(decision.action().unwrap(), Action::Double);
    assert_eq!(decision.probabilities.len(), NUM_ACTIONS);
}

#[test]
fn test_select_action_breaks_ties_toward_lower_index() {
    let network = constant_network([0.0; NUM_ACTIONS]);
    let policy = QPolicy::new(&network).unwrap();
    assert_eq!(policy.select_action(&[0, 0, 12, 12, 2, 0]).unwrap().action().unwrap(), Action::Hit);
}

#[test]
fn test_insurance_compares_hit_and_stand_scores() {
    let mut rng = StdRng::seed_from_u64(3);
    let buy = constant_network([2.0, -2.0, 0.0, 0.0, 0.0]);
    let decision = QPolicy::new(&buy).unwrap().insurance(&[0, 0, 20, 20, 11, 1], &mut rng).unwrap();
    assert_eq!(decision.action().unwrap(), Action::Hit);

    let decline = constant_network([-2.0, 2.0, 0.0, 0.0, 0.0]);
    let decision = QPolicy::new(&decline).unwrap().insurance(&[0, 0, 20, 20, 11, 1], &mut rng).unwrap();
    assert_eq!(decision.action().unwrap(), Action::Stand);
}

#[test]
fn test_insurance_tie_is_a_coin_flip() {
    let network = constant_network([0.0; NUM_ACTIONS]);
    let policy = QPolicy::new(&network).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let mut bought = 0;
    for _ in 0..200 {
        let decision = policy.insurance(&[0, 0, 20, 20, 11, 1], &mut rng).unwrap();
        assert!(decision.index == Action::Hit.index() || decision.index == Action::Stand.index());
        if decision.index == Action::Hit.index() {
            bought += 1;
        }
    }
    assert!(bought > 50 && bought < 150);
}

#[test]
fn test_action_index_order() {
    let indices: Vec<usize> = ACTIONS.iter().map(|a| a.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert!(Action::from_index(5).is_err());
    assert_eq!(Action::parse("sur").unwrap(), Action::Surrender);
    assert_eq!(Action::parse("Split").unwrap(), Action::Split);
}
