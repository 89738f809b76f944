//! Seat strategies: how a player bets, plays and insures.
//!
//! The table drives every seat through the [`Strategy`] trait and reports
//! back what happened through its hooks. Scripted players ignore the hooks;
//! the learner builds its episode tree from them.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::cards::{Card, Hand, HandId};
use crate::error::{BlackjackError, BlackjackResult};
use crate::payout::{InsuranceSettlement, Outcome};
use crate::policy::Action;

/// What a seat can see of the table when it has to act.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableView {
    pub upcard: Card,
    pub running_count: i32,
    pub true_count: f64,
    pub minimum_bet: u32,
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// Chips to stake on the next round, or `None` to sit it out.
    fn place_bet(&mut self, minimum_bet: u32, true_count: f64, chips: u32) -> BlackjackResult<Option<u32>>;

    /// Next action for `hand`. The table substitutes a legal fallback when
    /// the answer is not in `allowed`.
    fn decide(&mut self, hand: &Hand, view: &TableView, allowed: &[Action]) -> BlackjackResult<Action>;

    /// Whether to buy insurance against a dealer ace.
    fn insurance(&mut self, hand: &Hand, view: &TableView) -> BlackjackResult<bool>;

    fn on_split(&mut self, _parent: HandId, _children: [HandId; 2]) -> BlackjackResult<()> {
        Ok(())
    }

    fn on_outcome(&mut self, _hand: &Hand, _outcome: Outcome) -> BlackjackResult<()> {
        Ok(())
    }

    /// The table turned down a request for insurance the seat cannot cover;
    /// the round continues as if it had been declined.
    fn on_insurance_refused(&mut self, _hand: &Hand, _price: u32) -> BlackjackResult<()> {
        Ok(())
    }

    fn on_insurance_settled(&mut self, _settlement: InsuranceSettlement) -> BlackjackResult<()> {
        Ok(())
    }

    fn on_dealer(&mut self, _dealer: &Hand) -> BlackjackResult<()> {
        Ok(())
    }

    fn on_round_end(&mut self, _chips: u32) -> BlackjackResult<()> {
        Ok(())
    }
}

impl<S: Strategy + ?Sized> Strategy for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn place_bet(&mut self, minimum_bet: u32, true_count: f64, chips: u32) -> BlackjackResult<Option<u32>> {
        (**self).place_bet(minimum_bet, true_count, chips)
    }

    fn decide(&mut self, hand: &Hand, view: &TableView, allowed: &[Action]) -> BlackjackResult<Action> {
        (**self).decide(hand, view, allowed)
    }

    fn insurance(&mut self, hand: &Hand, view: &TableView) -> BlackjackResult<bool> {
        (**self).insurance(hand, view)
    }

    fn on_split(&mut self, parent: HandId, children: [HandId; 2]) -> BlackjackResult<()> {
        (**self).on_split(parent, children)
    }

    fn on_outcome(&mut self, hand: &Hand, outcome: Outcome) -> BlackjackResult<()> {
        (**self).on_outcome(hand, outcome)
    }

    fn on_insurance_refused(&mut self, hand: &Hand, price: u32) -> BlackjackResult<()> {
        (**self).on_insurance_refused(hand, price)
    }

    fn on_insurance_settled(&mut self, settlement: InsuranceSettlement) -> BlackjackResult<()> {
        (**self).on_insurance_settled(settlement)
    }

    fn on_dealer(&mut self, dealer: &Hand) -> BlackjackResult<()> {
        (**self).on_dealer(dealer)
    }

    fn on_round_end(&mut self, chips: u32) -> BlackjackResult<()> {
        (**self).on_round_end(chips)
    }
}

// ---------------------------------------------------------------------------
// Basic strategy chart
// ---------------------------------------------------------------------------

static BASIC_STRATEGY_JSON: &str = include_str!("../data/basic_strategy.json");

/// One chart cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Play {
    #[serde(rename = "h")]
    Hit,
    #[serde(rename = "s")]
    Stand,
    #[serde(rename = "d")]
    Double,
    #[serde(rename = "y")]
    Split,
    /// Double when the hand still has two cards, otherwise stand.
    #[serde(rename = "ds")]
    DoubleOrStand,
    #[serde(rename = "sur")]
    Surrender,
}

impl Play {
    pub fn action(self, hand: &Hand) -> Action {
        match self {
            Play::Hit => Action::Hit,
            Play::Stand => Action::Stand,
            Play::Double => Action::Double,
            Play::Split => Action::Split,
            Play::Surrender => Action::Surrender,
            Play::DoubleOrStand if hand.cards.len() == 2 => Action::Double,
            Play::DoubleOrStand => Action::Stand,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Play::Hit => "H",
            Play::Stand => "S",
            Play::Double => "D",
            Play::Split => "P",
            Play::DoubleOrStand => "Ds",
            Play::Surrender => "R",
        }
    }
}

/// Basic strategy keyed by hand class, then total; each row has one cell
/// per dealer upcard in `upcards` order.
#[derive(Debug, Deserialize)]
pub struct Chart {
    pub upcards: Vec<u8>,
    pub hard: HashMap<u8, Vec<Play>>,
    pub soft: HashMap<u8, Vec<Play>>,
    pub pairs: HashMap<u8, Vec<Play>>,
    pub aces: Vec<Play>,
}

static CHART: Lazy<Result<Chart, String>> =
    Lazy::new(|| serde_json::from_str(BASIC_STRATEGY_JSON).map_err(|e| e.to_string()));

pub fn chart() -> BlackjackResult<&'static Chart> {
    CHART
        .as_ref()
        .map_err(|e| BlackjackError::InvariantViolation(format!("basic strategy chart: {}", e)))
}

impl Chart {
    fn column(&self, upcard: Card) -> Option<usize> {
        self.upcards.iter().position(|&v| v == upcard.value())
    }

    /// Chart cell for `hand` against `upcard`, if the chart covers it.
    pub fn lookup(&self, hand: &Hand, upcard: Card) -> Option<Play> {
        let col = self.column(upcard)?;
        let total = hand.best_value();
        let row = if hand.is_pair() && hand.has_ace() {
            Some(&self.aces)
        } else if hand.is_pair() {
            self.pairs.get(&total)
        } else if hand.is_soft() {
            self.soft.get(&total)
        } else {
            self.hard.get(&total)
        };
        row.and_then(|cells| cells.get(col)).copied()
    }
}

/// Chart play, or the stand-on-17 rule for a hand outside the chart.
pub fn basic_play(hand: &Hand, upcard: Card) -> BlackjackResult<Play> {
    let play = chart()?.lookup(hand, upcard);
    Ok(play.unwrap_or(if hand.best_value() >= 17 { Play::Stand } else { Play::Hit }))
}

// ---------------------------------------------------------------------------
// Scripted players
// ---------------------------------------------------------------------------

/// Flat bets the minimum and follows the chart. Never insures.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    name: String,
}

impl BasicStrategy {
    pub fn new(name: &str) -> BasicStrategy {
        BasicStrategy { name: name.to_string() }
    }
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new("basic")
    }
}

fn minimum_if_affordable(minimum_bet: u32, chips: u32) -> Option<u32> {
    (chips >= minimum_bet).then_some(minimum_bet)
}

impl Strategy for BasicStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_bet(&mut self, minimum_bet: u32, _true_count: f64, chips: u32) -> BlackjackResult<Option<u32>> {
        Ok(minimum_if_affordable(minimum_bet, chips))
    }

    fn decide(&mut self, hand: &Hand, view: &TableView, _allowed: &[Action]) -> BlackjackResult<Action> {
        Ok(basic_play(hand, view.upcard)?.action(hand))
    }

    fn insurance(&mut self, _hand: &Hand, _view: &TableView) -> BlackjackResult<bool> {
        Ok(false)
    }
}

/// A departure from the chart once the true count crosses `index`.
#[derive(Debug, Clone, Copy)]
pub struct Deviation {
    pub pair: bool,
    pub total: u8,
    pub upcard: u8,
    pub index: f64,
    /// Play when the true count is at or above `index`.
    pub at_or_above: Play,
    pub below: Play,
}

const fn dev(pair: bool, total: u8, upcard: u8, index: f64, at_or_above: Play, below: Play) -> Deviation {
    Deviation { pair, total, upcard, index, at_or_above, below }
}

pub const DEVIATIONS: [Deviation; 17] = [
    dev(false, 16, 9, 5.0, Play::Stand, Play::Hit),
    dev(false, 16, 10, 0.0, Play::Stand, Play::Hit),
    dev(false, 15, 10, 4.0, Play::Stand, Play::Hit),
    dev(false, 13, 2, -1.0, Play::Stand, Play::Hit),
    dev(false, 13, 3, -2.0, Play::Stand, Play::Hit),
    dev(false, 12, 2, 4.0, Play::Stand, Play::Hit),
    dev(false, 12, 3, 2.0, Play::Stand, Play::Hit),
    dev(false, 12, 4, 0.0, Play::Stand, Play::Stand),
    dev(false, 12, 5, -1.0, Play::Stand, Play::Hit),
    dev(false, 12, 6, -1.0, Play::Stand, Play::Hit),
    dev(false, 11, 11, 0.0, Play::Double, Play::Double),
    dev(false, 10, 10, 4.0, Play::Double, Play::Hit),
    dev(false, 10, 11, 4.0, Play::Double, Play::Hit),
    dev(false, 9, 2, 1.0, Play::Double, Play::Hit),
    dev(false, 9, 7, 4.0, Play::Double, Play::Hit),
    dev(true, 20, 5, 5.0, Play::Split, Play::Stand),
    dev(true, 20, 6, 5.0, Play::Split, Play::Stand),
];

/// Insurance becomes profitable around this true count.
pub const INSURANCE_INDEX: f64 = 3.0;

pub fn find_deviation(hand: &Hand, upcard: Card) -> Option<Deviation> {
    if hand.is_soft() {
        return None;
    }
    let pair = hand.is_pair();
    DEVIATIONS
        .iter()
        .find(|d| d.pair == pair && d.total == hand.best_value() && d.upcard == upcard.value())
        .copied()
}

/// Hi-Lo counter: basic strategy plus count deviations, a bet ramp and
/// insurance at a high count.
#[derive(Debug, Clone)]
pub struct CardCounter {
    name: String,
}

impl CardCounter {
    pub fn new(name: &str) -> CardCounter {
        CardCounter { name: name.to_string() }
    }

    /// One extra minimum bet per point of positive true count.
    pub fn bet_for(minimum_bet: u32, true_count: f64) -> u32 {
        if true_count <= 0.0 {
            minimum_bet
        } else {
            minimum_bet + minimum_bet * true_count as u32
        }
    }
}

impl Default for CardCounter {
    fn default() -> Self {
        CardCounter::new("counter")
    }
}

impl Strategy for CardCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_bet(&mut self, minimum_bet: u32, true_count: f64, chips: u32) -> BlackjackResult<Option<u32>> {
        if chips < minimum_bet {
            return Ok(None);
        }
        Ok(Some(CardCounter::bet_for(minimum_bet, true_count).min(chips)))
    }

    fn decide(&mut self, hand: &Hand, view: &TableView, _allowed: &[Action]) -> BlackjackResult<Action> {
        let play = match find_deviation(hand, view.upcard) {
            Some(d) if view.true_count >= d.index => d.at_or_above,
            Some(d) => d.below,
            None => basic_play(hand, view.upcard)?,
        };
        Ok(play.action(hand))
    }

    fn insurance(&mut self, _hand: &Hand, view: &TableView) -> BlackjackResult<bool> {
        Ok(view.true_count >= INSURANCE_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    #[test]
    fn test_chart_parses() {
        let chart = chart().unwrap();
        assert_eq!(chart.upcards.len(), 10);
        assert!(chart.hard.values().all(|row| row.len() == 10));
        assert!(chart.soft.values().all(|row| row.len() == 10));
        assert!(chart.pairs.values().all(|row| row.len() == 10));
    }

    #[test]
    fn test_double_or_stand_depends_on_card_count() {
        let two = Hand::with_cards(0, 10, &parse_cards("As7d").unwrap());
        let three = Hand::with_cards(0, 10, &parse_cards("As4d3c").unwrap());
        assert_eq!(Play::DoubleOrStand.action(&two), Action::Double);
        assert_eq!(Play::DoubleOrStand.action(&three), Action::Stand);
    }
}
