use blackjack_rl::cards::{parse_card, parse_cards, Hand};
use blackjack_rl::policy::Action;
use blackjack_rl::strategy::*;

fn hand(notation: &str) -> Hand {
    Hand::with_cards(0, 25, &parse_cards(notation).unwrap())
}

fn view(upcard: &str, true_count: f64) -> TableView {
    TableView {
        upcard: parse_card(upcard).unwrap(),
        running_count: 0,
        true_count,
        minimum_bet: 25,
    }
}

fn basic(cards: &str, upcard: &str) -> Action {
    BasicStrategy::default()
        .decide(&hand(cards), &view(upcard, 0.0), &[])
        .unwrap()
}

#[test]
fn test_basic_hard_totals() {
    assert_eq!(basic("Ts6d", "Th"), Action::Hit);
    assert_eq!(basic("Ts6d", "6h"), Action::Stand);
    assert_eq!(basic("6s5d", "6h"), Action::Double);
    assert_eq!(basic("Ts2d", "4h"), Action::Stand);
    assert_eq!(basic("Ts2d", "2h"), Action::Hit);
    assert_eq!(basic("Ts7d", "Ah"), Action::Stand);
}

#[test]
fn test_basic_soft_totals() {
    assert_eq!(basic("As7d", "3h"), Action::Double);
    assert_eq!(basic("As4d3c", "3h"), Action::Stand);
    assert_eq!(basic("As7d", "9h"), Action::Hit);
    assert_eq!(basic("As2d", "5h"), Action::Double);
}

#[test]
fn test_basic_pairs() {
    assert_eq!(basic("8s8d", "Th"), Action::Split);
    assert_eq!(basic("AsAd", "Ah"), Action::Split);
    assert_eq!(basic("TsTd", "6h"), Action::Stand);
    assert_eq!(basic("TsKd", "6h"), Action::Stand);
    assert_eq!(basic("5s5d", "6h"), Action::Double);
    assert_eq!(basic("9s9d", "7h"), Action::Stand);
}

#[test]
fn test_basic_never_insures_and_bets_minimum() {
    let mut player = BasicStrategy::default();
    assert!(!player.insurance(&hand("Ts9d"), &view("As", 10.0)).unwrap());
    assert_eq!(player.place_bet(25, 5.0, 1000).unwrap(), Some(25));
    assert_eq!(player.place_bet(25, 0.0, 10).unwrap(), None);
}

#[test]
fn test_chart_covers_every_upcard() {
    let chart = chart().unwrap();
    assert_eq!(chart.upcards, vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    assert_eq!(chart.lookup(&hand("Ts6d"), parse_card("Ah").unwrap()), Some(Play::Hit));
}

#[test]
fn test_counter_follows_deviation_indices() {
    let mut counter = CardCounter::default();
    let sixteen = hand("Ts6d");
    assert_eq!(counter.decide(&sixteen, &view("Th", 0.0), &[]).unwrap(), Action::Stand);
    assert_eq!(counter.decide(&sixteen, &view("Th", -1.0), &[]).unwrap(), Action::Hit);
    let thirteen = hand("Ts3d");
    assert_eq!(counter.decide(&thirteen, &view("2h", -2.0), &[]).unwrap(), Action::Hit);
    assert_eq!(counter.decide(&thirteen, &view("2h", -1.0), &[]).unwrap(), Action::Stand);
    let tens = hand("TsTd");
    assert_eq!(counter.decide(&tens, &view("5h", 5.0), &[]).unwrap(), Action::Split);
    assert_eq!(counter.decide(&tens, &view("5h", 4.0), &[]).unwrap(), Action::Stand);
}

#[test]
fn test_counter_falls_back_to_chart() {
    let mut counter = CardCounter::default();
    assert_eq!(counter.decide(&hand("8s8d"), &view("Th", 6.0), &[]).unwrap(), Action::Split);
    assert_eq!(counter.decide(&hand("As7d"), &view("4h", 6.0), &[]).unwrap(), Action::Double);
}

#[test]
fn test_counter_insures_at_high_count() {
    let mut counter = CardCounter::default();
    assert!(counter.insurance(&hand("Ts9d"), &view("As", 3.0)).unwrap());
    assert!(!counter.insurance(&hand("Ts9d"), &view("As", 2.0)).unwrap());
}

#[test]
fn test_counter_bet_ramp() {
    assert_eq!(CardCounter::bet_for(25, -2.0), 25);
    assert_eq!(CardCounter::bet_for(25, 0.0), 25);
    assert_eq!(CardCounter::bet_for(25, 3.0), 100);
    let mut counter = CardCounter::default();
    assert_eq!(counter.place_bet(25, 3.0, 1000).unwrap(), Some(100));
    assert_eq!(counter.place_bet(25, 3.0, 90).unwrap(), Some(90));
    assert_eq!(counter.place_bet(25, 3.0, 20).unwrap(), None);
}

#[test]
fn test_deviation_lookup_ignores_soft_hands() {
    assert!(find_deviation(&hand("As5d"), parse_card("Th").unwrap()).is_none());
    assert!(find_deviation(&hand("Ts6d"), parse_card("9h").unwrap()).is_some());
}
