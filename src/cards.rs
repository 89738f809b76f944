use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{BlackjackError, BlackjackResult};

pub const CARDS_PER_DECK: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub fn from_char(c: char) -> BlackjackResult<Rank> {
        match c {
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            _ => Err(BlackjackError::InvalidCardNotation(c.to_string())),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// Blackjack value with the ace counted high.
    pub fn value(self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }

    /// Hi-Lo count tag.
    pub fn hi_lo(self) -> i32 {
        match self.value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> BlackjackResult<Suit> {
        match c.to_ascii_lowercase() {
            's' => Ok(Suit::Spades),
            'h' => Ok(Suit::Hearts),
            'd' => Ok(Suit::Diamonds),
            'c' => Ok(Suit::Clubs),
            _ => Err(BlackjackError::InvalidCardNotation(c.to_string())),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

pub fn parse_card(notation: &str) -> BlackjackResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() != 2 {
        return Err(BlackjackError::InvalidCardNotation(notation.to_string()));
    }
    let rank = Rank::from_char(chars[0].to_ascii_uppercase())?;
    let suit = Suit::from_char(chars[1])?;
    Ok(Card::new(rank, suit))
}

/// Parse a run of two-character cards, e.g. "AsKd" or "As Kd 5c".
pub fn parse_cards(notation: &str) -> BlackjackResult<Vec<Card>> {
    let notation = notation.trim().replace([' ', ','], "");
    if notation.len() % 2 != 0 {
        return Err(BlackjackError::InvalidCardNotation(notation));
    }
    let chars: Vec<char> = notation.chars().collect();
    chars
        .chunks(2)
        .map(|pair| parse_card(&pair.iter().collect::<String>()))
        .collect()
}

// ---------------------------------------------------------------------------
// Hands
// ---------------------------------------------------------------------------

/// Identifies one physical hand within a round. The opening hand is 0;
/// every split hands out fresh ids.
pub type HandId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub id: HandId,
    pub cards: Vec<Card>,
    pub bet: u32,
}

impl Hand {
    pub fn new(id: HandId, bet: u32) -> Hand {
        Hand { id, cards: Vec::new(), bet }
    }

    pub fn with_cards(id: HandId, bet: u32, cards: &[Card]) -> Hand {
        Hand { id, cards: cards.to_vec(), bet }
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn has_ace(&self) -> bool {
        self.cards.iter().any(Card::is_ace)
    }

    /// Total with every ace counted as one.
    pub fn min_value(&self) -> u8 {
        self.cards
            .iter()
            .map(|c| if c.is_ace() { 1 } else { c.value() })
            .sum()
    }

    /// Total with one ace counted as eleven, if there is one.
    pub fn max_value(&self) -> u8 {
        if self.has_ace() {
            self.min_value() + 10
        } else {
            self.min_value()
        }
    }

    pub fn best_value(&self) -> u8 {
        let max = self.max_value();
        if max <= 21 {
            max
        } else {
            self.min_value()
        }
    }

    pub fn is_soft(&self) -> bool {
        self.has_ace() && self.max_value() <= 21
    }

    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.best_value() == 21
    }

    pub fn is_bust(&self) -> bool {
        self.min_value() > 21
    }

    pub fn beats(&self, dealer: &Hand) -> bool {
        if self.is_bust() {
            return false;
        }
        dealer.is_bust() || self.best_value() > dealer.best_value()
    }

    pub fn ties(&self, dealer: &Hand) -> bool {
        !self.is_bust() && !dealer.is_bust() && self.best_value() == dealer.best_value()
    }

    pub fn pretty(&self) -> String {
        self.cards.iter().map(Card::pretty).collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shoe
// ---------------------------------------------------------------------------

pub struct Shoe {
    cards: Vec<Card>,
    dealt: usize,
    cut_off: usize,
    running_count: i32,
    rng: StdRng,
}

impl Shoe {
    /// A freshly shuffled shoe of `decks` decks. The shoe asks to be
    /// reshuffled once `penetration` of its cards have been dealt.
    pub fn new(decks: usize, penetration: f64, seed: Option<u64>) -> BlackjackResult<Shoe> {
        if decks == 0 {
            return Err(BlackjackError::InvalidValue("Shoe needs at least one deck".to_string()));
        }
        if !(penetration > 0.0 && penetration < 1.0) {
            return Err(BlackjackError::InvalidValue(format!(
                "Penetration must be between 0 and 1, got {}",
                penetration
            )));
        }
        let cards: Vec<Card> = (0..decks)
            .flat_map(|_| {
                ALL_RANKS
                    .iter()
                    .flat_map(|&r| ALL_SUITS.iter().map(move |&s| Card::new(r, s)))
            })
            .collect();
        let cut_off = (cards.len() as f64 * penetration) as usize;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut shoe = Shoe {
            cards,
            dealt: 0,
            cut_off,
            running_count: 0,
            rng,
        };
        shoe.shuffle()?;
        Ok(shoe)
    }

    /// A shoe that deals `cards` in order and never reshuffles on its own.
    pub fn stacked(cards: Vec<Card>) -> Shoe {
        let cut_off = cards.len();
        Shoe {
            cards,
            dealt: 0,
            cut_off,
            running_count: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn needs_shuffle(&self) -> bool {
        self.dealt >= self.cut_off
    }

    /// Shuffle every card back in, cut at a random point and burn one card.
    pub fn shuffle(&mut self) -> BlackjackResult<()> {
        if self.cards.is_empty() {
            return Err(BlackjackError::ShoeExhausted);
        }
        self.cards.shuffle(&mut self.rng);
        let cut = self.rng.gen_range(0..self.cards.len());
        self.cards.rotate_left(cut);
        self.dealt = 0;
        self.running_count = 0;
        let burned = self.draw()?;
        self.reveal(burned);
        log::debug!("shoe shuffled, burned {}", burned);
        Ok(())
    }

    pub fn draw(&mut self) -> BlackjackResult<Card> {
        let card = *self.cards.get(self.dealt).ok_or(BlackjackError::ShoeExhausted)?;
        self.dealt += 1;
        Ok(card)
    }

    /// Count a card that has become visible to the table.
    pub fn reveal(&mut self, card: Card) {
        self.running_count += card.rank.hi_lo();
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.dealt
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn true_count(&self) -> f64 {
        let decks_remaining = (self.remaining() as f64 / CARDS_PER_DECK as f64).round().max(1.0);
        (self.running_count as f64 / decks_remaining).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hi_lo_tags() {
        assert_eq!(Rank::Five.hi_lo(), 1);
        assert_eq!(Rank::Eight.hi_lo(), 0);
        assert_eq!(Rank::King.hi_lo(), -1);
        assert_eq!(Rank::Ace.hi_lo(), -1);
    }

    #[test]
    fn test_parse_cards_ignores_separators() {
        let cards = parse_cards("As, Kd 5c").unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[2], Card::new(Rank::Five, Suit::Clubs));
    }
}
