//! The blackjack table: shoe, dealer and a row of seats.
//!
//! A round goes bet, deal, insurance, dealer peek, player hands, dealer
//! hand, settlement. Payouts follow [`Outcome::payout`]; every hand's
//! outcome is reported to its seat's strategy as soon as it is known.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::cards::{Card, Hand, HandId, Shoe};
use crate::error::{BlackjackError, BlackjackResult};
use crate::payout::{insurance_price, InsuranceSettlement, Outcome};
use crate::policy::Action;
use crate::strategy::{Strategy, TableView};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub decks: usize,
    pub minimum_bet: u32,
    /// Fraction of the shoe dealt before the next round reshuffles.
    pub penetration: f64,
    pub starting_chips: u32,
    /// Most hands one seat may hold in a round, counting split hands.
    pub max_hands: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            decks: 6,
            minimum_bet: 25,
            penetration: 0.75,
            starting_chips: 1000,
            max_hands: 4,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> BlackjackResult<()> {
        if self.minimum_bet == 0 {
            return Err(BlackjackError::InvalidValue("Minimum bet must be positive".to_string()));
        }
        if self.max_hands == 0 {
            return Err(BlackjackError::InvalidValue("A seat needs at least one hand".to_string()));
        }
        Ok(())
    }

    pub fn shoe(&self, seed: Option<u64>) -> BlackjackResult<Shoe> {
        Shoe::new(self.decks, self.penetration, seed)
    }
}

/// Running tally of one seat's results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatStats {
    pub rounds: usize,
    pub hands: usize,
    pub wins: usize,
    pub blackjacks: usize,
    pub pushes: usize,
    pub losses: usize,
    pub busts: usize,
    pub surrenders: usize,
    pub doubles: usize,
    pub splits: usize,
    pub insurance_bought: usize,
    pub wagered: u64,
}

impl SeatStats {
    fn record(&mut self, outcome: Outcome, bet: u32) {
        self.hands += 1;
        self.wagered += bet as u64;
        match outcome {
            Outcome::Won => self.wins += 1,
            Outcome::Blackjack => self.blackjacks += 1,
            Outcome::Push | Outcome::Insured => self.pushes += 1,
            Outcome::Lost => self.losses += 1,
            Outcome::Bust => self.busts += 1,
            Outcome::Surrender => self.surrenders += 1,
        }
    }
}

pub struct Seat<'a> {
    pub strategy: Box<dyn Strategy + 'a>,
    pub chips: u32,
    pub stats: SeatStats,
}

impl<'a> Seat<'a> {
    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    fn settle(&mut self, hand: &Hand, outcome: Outcome) -> BlackjackResult<()> {
        self.chips += outcome.payout(hand.bet);
        self.stats.record(outcome, hand.bet);
        log::debug!("{}: {} [{}] {} for {}", self.name(), hand, hand.best_value(), outcome, hand.bet);
        self.strategy.on_outcome(hand, outcome)
    }

    fn settle_insurance(&mut self, settlement: InsuranceSettlement) -> BlackjackResult<()> {
        self.chips += settlement.payout();
        self.strategy.on_insurance_settled(settlement)
    }
}

/// One seat's state within a round.
struct SeatRound {
    seat: usize,
    bet: u32,
    total_bet: u32,
    insurance: u32,
    offered_insurance: bool,
    pending: VecDeque<Hand>,
    standing: Vec<Hand>,
    hands_dealt: usize,
    next_id: HandId,
}

/// Seats that placed a bet in a round, by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub seated: Vec<usize>,
    pub dealer: Vec<Card>,
}

impl RoundSummary {
    pub fn played(&self) -> bool {
        !self.seated.is_empty()
    }
}

pub struct Table<'a> {
    config: TableConfig,
    shoe: Shoe,
    seats: Vec<Seat<'a>>,
}

impl<'a> Table<'a> {
    pub fn new(config: TableConfig, shoe: Shoe) -> BlackjackResult<Table<'a>> {
        config.validate()?;
        Ok(Table { config, shoe, seats: Vec::new() })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    /// Seat a player with the configured starting stack. Returns the seat index.
    pub fn seat<S: Strategy + 'a>(&mut self, strategy: S) -> usize {
        self.seat_with_chips(strategy, self.config.starting_chips)
    }

    pub fn seat_with_chips<S: Strategy + 'a>(&mut self, strategy: S, chips: u32) -> usize {
        self.seats.push(Seat {
            strategy: Box::new(strategy),
            chips,
            stats: SeatStats::default(),
        });
        self.seats.len() - 1
    }

    pub fn seats(&self) -> &[Seat<'a>] {
        &self.seats
    }

    pub fn into_seats(self) -> Vec<Seat<'a>> {
        self.seats
    }

    /// Play up to `rounds` rounds, stopping early once nobody bets.
    pub fn play(&mut self, rounds: usize) -> BlackjackResult<usize> {
        for played in 0..rounds {
            if !self.play_round()?.played() {
                log::info!("no seat can cover the minimum bet; stopping after {} rounds", played);
                return Ok(played);
            }
        }
        Ok(rounds)
    }

    fn view(&self, upcard: Card) -> TableView {
        TableView {
            upcard,
            running_count: self.shoe.running_count(),
            true_count: self.shoe.true_count(),
            minimum_bet: self.config.minimum_bet,
        }
    }

    /// Deal the next card, reshuffling the whole shoe if a round runs it dry.
    fn draw(&mut self) -> BlackjackResult<Card> {
        if self.shoe.remaining() == 0 {
            log::info!("shoe ran out mid-round; reshuffling");
            self.shoe.shuffle()?;
        }
        self.shoe.draw()
    }

    fn draw_visible(&mut self) -> BlackjackResult<Card> {
        let card = self.draw()?;
        self.shoe.reveal(card);
        Ok(card)
    }

    pub fn play_round(&mut self) -> BlackjackResult<RoundSummary> {
        if self.shoe.needs_shuffle() {
            self.shoe.shuffle()?;
        }

        let mut rounds = self.collect_bets()?;
        if rounds.is_empty() {
            return Ok(RoundSummary::default());
        }

        // Deal: one card each, dealer hole card, second card each, upcard.
        for round in rounds.iter_mut() {
            let card = self.draw_visible()?;
            if let Some(hand) = round.pending.front_mut() {
                hand.add(card);
            }
        }
        let hole = self.draw()?;
        for round in rounds.iter_mut() {
            let card = self.draw_visible()?;
            if let Some(hand) = round.pending.front_mut() {
                hand.add(card);
            }
        }
        let upcard = self.draw_visible()?;
        let mut dealer = Hand::with_cards(0, 0, &[hole, upcard]);
        log::debug!("dealer shows {}", upcard);

        if upcard.is_ace() {
            self.offer_insurance(&mut rounds, upcard)?;
        }

        if dealer.is_blackjack() {
            self.shoe.reveal(hole);
            log::debug!("dealer blackjack {}", dealer);
            for round in &rounds {
                self.settle_dealer_blackjack(round)?;
            }
            return self.finish_round(&rounds, &dealer);
        }

        for round in rounds.iter_mut() {
            if round.offered_insurance {
                let seat = &mut self.seats[round.seat];
                let settlement = if round.insurance > 0 {
                    InsuranceSettlement::Forfeited { insurance: round.insurance }
                } else {
                    InsuranceSettlement::Declined { dealer_blackjack: false, bet: round.bet }
                };
                seat.settle_insurance(settlement)?;
            }
            self.play_seat(round, upcard)?;
        }

        self.shoe.reveal(hole);
        if rounds.iter().any(|r| !r.standing.is_empty()) {
            while dealer.best_value() < 17 {
                let card = self.draw_visible()?;
                dealer.add(card);
            }
        }
        log::debug!("dealer finishes with {} [{}]", dealer, dealer.best_value());

        for round in &rounds {
            let seat = &mut self.seats[round.seat];
            for hand in &round.standing {
                let outcome = if hand.beats(&dealer) {
                    Outcome::Won
                } else if hand.ties(&dealer) {
                    Outcome::Push
                } else {
                    Outcome::Lost
                };
                seat.settle(hand, outcome)?;
            }
        }
        self.finish_round(&rounds, &dealer)
    }

    fn collect_bets(&mut self) -> BlackjackResult<Vec<SeatRound>> {
        let minimum_bet = self.config.minimum_bet;
        let true_count = self.shoe.true_count();
        let mut rounds = Vec::new();
        for (index, seat) in self.seats.iter_mut().enumerate() {
            let bet = match seat.strategy.place_bet(minimum_bet, true_count, seat.chips)? {
                Some(bet) => bet,
                None => continue,
            };
            if bet < minimum_bet || bet > seat.chips {
                log::warn!(
                    "{}: bet of {} rejected (minimum {}, chips {}); sitting out",
                    seat.name(),
                    bet,
                    minimum_bet,
                    seat.chips
                );
                continue;
            }
            seat.chips -= bet;
            let mut pending = VecDeque::new();
            pending.push_back(Hand::new(0, bet));
            rounds.push(SeatRound {
                seat: index,
                bet,
                total_bet: bet,
                insurance: 0,
                offered_insurance: false,
                pending,
                standing: Vec::new(),
                hands_dealt: 1,
                next_id: 1,
            });
        }
        Ok(rounds)
    }

    fn offer_insurance(&mut self, rounds: &mut [SeatRound], upcard: Card) -> BlackjackResult<()> {
        let view = self.view(upcard);
        for round in rounds.iter_mut() {
            let seat = &mut self.seats[round.seat];
            let hand = match round.pending.front() {
                Some(hand) => hand,
                None => continue,
            };
            round.offered_insurance = true;
            let price = insurance_price(round.total_bet);
            if seat.strategy.insurance(hand, &view)? {
                if price > 0 && price <= seat.chips {
                    seat.chips -= price;
                    round.insurance = price;
                    seat.stats.insurance_bought += 1;
                    log::debug!("{}: insured for {}", seat.name(), price);
                } else {
                    log::warn!(
                        "{}: insurance of {} not allowed with {} chips, declining",
                        seat.name(),
                        price,
                        seat.chips
                    );
                    seat.strategy.on_insurance_refused(hand, price)?;
                }
            }
        }
        Ok(())
    }

    fn settle_dealer_blackjack(&mut self, round: &SeatRound) -> BlackjackResult<()> {
        let seat = &mut self.seats[round.seat];
        if round.offered_insurance {
            let settlement = if round.insurance > 0 {
                InsuranceSettlement::Paid { insurance: round.insurance, bet: round.bet }
            } else {
                InsuranceSettlement::Declined { dealer_blackjack: true, bet: round.bet }
            };
            seat.settle_insurance(settlement)?;
        }
        for hand in &round.pending {
            let outcome = if hand.is_blackjack() {
                Outcome::Push
            } else if round.insurance > 0 {
                Outcome::Insured
            } else {
                Outcome::Lost
            };
            seat.settle(hand, outcome)?;
        }
        Ok(())
    }

    /// Play every hand of one seat, split hands in the order they were made.
    fn play_seat(&mut self, round: &mut SeatRound, upcard: Card) -> BlackjackResult<()> {
        while let Some(mut hand) = round.pending.pop_front() {
            if hand.is_blackjack() {
                self.seats[round.seat].settle(&hand, Outcome::Blackjack)?;
                continue;
            }
            loop {
                let view = self.view(upcard);
                let seat = &mut self.seats[round.seat];
                let allowed = allowed_actions(&hand, seat.chips, round.hands_dealt, &self.config);
                let wanted = seat.strategy.decide(&hand, &view, &allowed)?;
                let action = if allowed.contains(&wanted) {
                    wanted
                } else {
                    let substitute = fallback(wanted);
                    log::warn!("{}: {} not allowed on {}, playing {}", seat.name(), wanted, hand, substitute);
                    substitute
                };

                match action {
                    Action::Hit => {
                        let card = self.draw_visible()?;
                        hand.add(card);
                        if hand.is_bust() {
                            self.seats[round.seat].settle(&hand, Outcome::Bust)?;
                            break;
                        }
                    }
                    Action::Stand => {
                        round.standing.push(hand);
                        break;
                    }
                    Action::Double => {
                        let seat = &mut self.seats[round.seat];
                        seat.chips -= hand.bet;
                        seat.stats.doubles += 1;
                        round.total_bet += hand.bet;
                        hand.bet *= 2;
                        let card = self.draw_visible()?;
                        hand.add(card);
                        if hand.is_bust() {
                            self.seats[round.seat].settle(&hand, Outcome::Bust)?;
                        } else {
                            round.standing.push(hand);
                        }
                        break;
                    }
                    Action::Split => {
                        let seat = &mut self.seats[round.seat];
                        seat.chips -= hand.bet;
                        seat.stats.splits += 1;
                        round.total_bet += hand.bet;
                        let ids = [round.next_id, round.next_id + 1];
                        round.next_id += 2;
                        round.hands_dealt += 1;
                        let mut left = Hand::with_cards(ids[0], hand.bet, &hand.cards[..1]);
                        let mut right = Hand::with_cards(ids[1], hand.bet, &hand.cards[1..]);
                        left.add(self.draw_visible()?);
                        right.add(self.draw_visible()?);
                        self.seats[round.seat].strategy.on_split(hand.id, ids)?;
                        round.pending.push_back(left);
                        round.pending.push_back(right);
                        break;
                    }
                    Action::Surrender => {
                        self.seats[round.seat].settle(&hand, Outcome::Surrender)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn finish_round(&mut self, rounds: &[SeatRound], dealer: &Hand) -> BlackjackResult<RoundSummary> {
        for round in rounds {
            let seat = &mut self.seats[round.seat];
            seat.stats.rounds += 1;
            seat.strategy.on_dealer(dealer)?;
            seat.strategy.on_round_end(seat.chips)?;
        }
        Ok(RoundSummary {
            seated: rounds.iter().map(|r| r.seat).collect(),
            dealer: dealer.cards.clone(),
        })
    }
}

/// Actions legal for `hand` given the seat's chips and how many hands the
/// seat already holds this round.
pub fn allowed_actions(hand: &Hand, chips: u32, hands_dealt: usize, config: &TableConfig) -> Vec<Action> {
    let mut allowed = vec![Action::Hit, Action::Stand];
    let opening = hand.cards.len() == 2;
    if opening && chips >= hand.bet {
        allowed.push(Action::Double);
    }
    if hand.is_pair() && chips >= hand.bet && hands_dealt < config.max_hands {
        allowed.push(Action::Split);
    }
    if opening {
        allowed.push(Action::Surrender);
    }
    allowed
}

/// Legal substitute for an action the table refused.
pub fn fallback(action: Action) -> Action {
    match action {
        Action::Double => Action::Hit,
        Action::Split | Action::Surrender => Action::Stand,
        other => other,
    }
}
