use blackjack_rl::cards::*;
use blackjack_rl::error::BlackjackError;

fn hand(notation: &str) -> Hand {
    Hand::with_cards(0, 10, &parse_cards(notation).unwrap())
}

#[test]
fn test_card_values() {
    assert_eq!(Card::new(Rank::Ace, Suit::Spades).value(), 11);
    assert_eq!(Card::new(Rank::King, Suit::Hearts).value(), 10);
    assert_eq!(Card::new(Rank::Seven, Suit::Clubs).value(), 7);
}

#[test]
fn test_invalid_notation() {
    assert!(Rank::from_char('X').is_err());
    assert!(Suit::from_char('x').is_err());
    assert!(parse_card("A").is_err());
    assert!(parse_cards("AsK").is_err());
}

#[test]
fn test_card_display_round_trip() {
    let card = parse_card("Td").unwrap();
    assert_eq!(card.to_string(), "Td");
}

#[test]
fn test_min_and_max_values() {
    let h = hand("As6d");
    assert_eq!(h.min_value(), 7);
    assert_eq!(h.max_value(), 17);
    assert_eq!(h.best_value(), 17);
    assert!(h.is_soft());
}

#[test]
fn test_two_aces_count_one_high() {
    let h = hand("AsAd");
    assert_eq!(h.min_value(), 2);
    assert_eq!(h.max_value(), 12);
    assert!(h.is_pair());
}

#[test]
fn test_soft_hand_turns_hard() {
    let h = hand("As6d9c");
    assert_eq!(h.best_value(), 16);
    assert!(!h.is_soft());
    assert!(!h.is_bust());
}

#[test]
fn test_pair_needs_equal_ranks() {
    assert!(hand("8s8d").is_pair());
    assert!(!hand("KsQd").is_pair());
    assert!(!hand("8s8d8c").is_pair());
}

#[test]
fn test_blackjack_needs_two_cards() {
    assert!(hand("AsKd").is_blackjack());
    assert!(!hand("As5d5c").is_blackjack());
}

#[test]
fn test_bust() {
    assert!(hand("KsQd5c").is_bust());
    assert!(!hand("KsQdAc").is_bust());
}

#[test]
fn test_beats_and_ties() {
    let dealer = hand("Ts7d");
    assert!(hand("Ts9d").beats(&dealer));
    assert!(hand("9s8d").ties(&dealer));
    assert!(!hand("Ts6d").beats(&dealer));
    assert!(hand("Ts6d").beats(&hand("TsQd5c")));
    assert!(!hand("TsQd5c").beats(&hand("TsQd5c")));
}

#[test]
fn test_shoe_rejects_bad_settings() {
    assert!(matches!(Shoe::new(0, 0.75, Some(1)), Err(BlackjackError::InvalidValue(_))));
    assert!(Shoe::new(6, 1.0, Some(1)).is_err());
    assert!(Shoe::new(6, 0.0, Some(1)).is_err());
}

#[test]
fn test_new_shoe_burns_one_card() {
    let shoe = Shoe::new(2, 0.75, Some(3)).unwrap();
    assert_eq!(shoe.remaining(), 2 * CARDS_PER_DECK - 1);
    assert!(!shoe.needs_shuffle());
}

#[test]
fn test_seeded_shoes_deal_alike() {
    let mut a = Shoe::new(6, 0.75, Some(42)).unwrap();
    let mut b = Shoe::new(6, 0.75, Some(42)).unwrap();
    for _ in 0..20 {
        assert_eq!(a.draw().unwrap(), b.draw().unwrap());
    }
}

#[test]
fn test_stacked_shoe_deals_in_order_then_runs_out() {
    let cards = parse_cards("AsKd").unwrap();
    let mut shoe = Shoe::stacked(cards.clone());
    assert_eq!(shoe.draw().unwrap(), cards[0]);
    assert_eq!(shoe.draw().unwrap(), cards[1]);
    assert!(matches!(shoe.draw(), Err(BlackjackError::ShoeExhausted)));
    assert!(shoe.needs_shuffle());
}

#[test]
fn test_empty_shoe_cannot_shuffle() {
    let mut shoe = Shoe::stacked(Vec::new());
    assert!(matches!(shoe.shuffle(), Err(BlackjackError::ShoeExhausted)));
}

#[test]
fn test_true_count_divides_by_decks_remaining() {
    let mut shoe = Shoe::stacked(vec![Card::new(Rank::Two, Suit::Spades); 104]);
    for _ in 0..4 {
        let card = shoe.draw().unwrap();
        shoe.reveal(card);
    }
    assert_eq!(shoe.running_count(), 4);
    // 100 cards left rounds to two decks.
    assert_eq!(shoe.true_count(), 2.0);
}

#[test]
fn test_true_count_uses_at_least_one_deck() {
    let mut shoe = Shoe::stacked(vec![Card::new(Rank::King, Suit::Spades); 10]);
    for _ in 0..3 {
        let card = shoe.draw().unwrap();
        shoe.reveal(card);
    }
    assert_eq!(shoe.true_count(), -3.0);
}
