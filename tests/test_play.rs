use std::io::Cursor;

use blackjack_rl::cards::{parse_cards, Shoe};
use blackjack_rl::learner::LearnerConfig;
use blackjack_rl::play::*;
use blackjack_rl::simulation::StrategyKind;
use blackjack_rl::table::{Table, TableConfig};

/// Play one round against a stacked shoe with scripted console input.
/// Returns the seat's chips and everything written to the console.
fn console_round(shoe: &str, input: &str) -> (u32, String) {
    colored::control::set_override(false);
    let mut reader = Cursor::new(input.as_bytes());
    let mut output: Vec<u8> = Vec::new();
    let chips = {
        let shoe = Shoe::stacked(parse_cards(shoe).unwrap());
        let mut table = Table::new(TableConfig::default(), shoe).unwrap();
        table.seat(Human::new("you", &mut reader, &mut output));
        table.play_round().unwrap();
        table.seats()[0].chips
    };
    (chips, String::from_utf8(output).unwrap())
}

#[test]
fn test_console_bet_and_stand() {
    let (chips, text) = console_round("Th 9d 7c 8s", "100\ns\n");
    assert_eq!(chips, 1000);
    assert!(text.contains("Chips: 1000"));
    assert!(text.contains("PUSH"));
    assert!(text.contains("Dealer"));
}

#[test]
fn test_empty_bet_takes_the_minimum() {
    let (chips, _) = console_round("Th 9d 6c Ts", "\ns\n");
    // 16 against 19 loses the 25 minimum.
    assert_eq!(chips, 975);
}

#[test]
fn test_invalid_input_prompts_again() {
    let (chips, text) = console_round("Th 9d 7c 8s", "abc\n10\n25\ny\nfoo\ns\n");
    assert!(text.contains("Enter a whole number of chips"));
    assert!(text.contains("Bet between 25 and 1000."));
    assert!(text.contains("You are not allowed to split."));
    assert!(text.contains("Choose one of: hit (h), stand (s)"));
    assert_eq!(chips, 1000);
}

#[test]
fn test_end_of_input_stands_the_hand() {
    let (chips, text) = console_round("Th 9d 7c 8s", "25\n");
    assert_eq!(chips, 1000);
    assert!(text.contains("PUSH"));
}

#[test]
fn test_console_double() {
    let (chips, text) = console_round("4h Td 6c 5s Ks Kh", "25\nd\n");
    assert_eq!(chips, 1050);
    assert!(text.contains("WON"));
}

#[test]
fn test_console_insurance_pays_on_dealer_blackjack() {
    let (chips, text) = console_round("Th Kd 7c As", "100\ny\n");
    assert_eq!(chips, 1000);
    assert!(text.contains("Insurance?"));
    assert!(text.contains("Insurance pays 50."));
    assert!(text.contains("INSURED"));
}

#[test]
fn test_session_ends_when_player_leaves() {
    colored::control::set_override(false);
    let mut reader = Cursor::new("q\n".as_bytes());
    let mut output: Vec<u8> = Vec::new();
    run_interactive_session(
        &mut reader,
        &mut output,
        &[StrategyKind::Basic],
        &TableConfig::default(),
        &LearnerConfig::default(),
        Some(5),
    )
    .unwrap();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("6 decks, minimum bet 25"));
    assert!(text.contains("basic"));
    assert!(text.contains("Thanks for playing."));
}

#[test]
fn test_session_with_a_learner_robot() {
    colored::control::set_override(false);
    let mut reader = Cursor::new("25\ns\nq\n".as_bytes());
    let mut output: Vec<u8> = Vec::new();
    let learner = LearnerConfig {
        seed: Some(2),
        ..LearnerConfig::default()
    };
    run_interactive_session(
        &mut reader,
        &mut output,
        &[StrategyKind::Learner],
        &TableConfig::default(),
        &learner,
        Some(8),
    )
    .unwrap();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("learner"));
    assert!(text.contains("Thanks for playing."));
}
