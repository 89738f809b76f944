use std::io::{self, BufRead, Write};

use colored::Colorize;
use itertools::Itertools;

use crate::cards::{Hand, HandId};
use crate::display::{card_display, hand_display, results_table, styled_outcome};
use crate::error::BlackjackResult;
use crate::learner::{LearnerConfig, ReinforcementLearner};
use crate::payout::{InsuranceSettlement, Outcome};
use crate::policy::Action;
use crate::simulation::{SessionResult, StrategyKind};
use crate::strategy::{BasicStrategy, CardCounter, Strategy, TableView};
use crate::table::{Table, TableConfig};

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

fn prompt(message: &str, default: Option<&str>, reader: &mut dyn BufRead, writer: &mut dyn Write) -> String {
    if let Some(d) = default {
        write!(writer, "{} [{}]: ", message, d).ok();
    } else {
        write!(writer, "{}: ", message).ok();
    }
    writer.flush().ok();

    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => "q".to_string(),
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.unwrap_or("").to_string()
            } else {
                trimmed
            }
        }
        Err(_) => "q".to_string(),
    }
}

fn prompt_yn(message: &str, default: &str, reader: &mut dyn BufRead, writer: &mut dyn Write) -> Option<bool> {
    let answer = prompt(&format!("{} (y/n)", message), Some(default), reader, writer);
    if answer.to_lowercase() == "q" {
        return None;
    }
    Some(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn action_menu(allowed: &[Action]) -> String {
    allowed
        .iter()
        .map(|a| format!("{} ({})", a, a.shorthand().bold()))
        .join(", ")
}

// ---------------------------------------------------------------------------
// Human seat
// ---------------------------------------------------------------------------

/// A seat played from the console.
pub struct Human<'a> {
    name: String,
    reader: &'a mut dyn BufRead,
    writer: &'a mut dyn Write,
}

impl<'a> Human<'a> {
    pub fn new(name: &str, reader: &'a mut dyn BufRead, writer: &'a mut dyn Write) -> Human<'a> {
        Human {
            name: name.to_string(),
            reader,
            writer,
        }
    }
}

impl<'a> Strategy for Human<'a> {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_bet(&mut self, minimum_bet: u32, _true_count: f64, chips: u32) -> BlackjackResult<Option<u32>> {
        writeln!(self.writer).ok();
        writeln!(self.writer, "  {} {}", "Chips:".bold(), chips).ok();
        if chips < minimum_bet {
            writeln!(self.writer, "  {}", "Not enough chips for the minimum bet.".red()).ok();
            return Ok(None);
        }
        let default = minimum_bet.to_string();
        loop {
            let answer = prompt("  Bet", Some(&default), self.reader, self.writer);
            if answer.to_lowercase() == "q" {
                return Ok(None);
            }
            match answer.parse::<u32>() {
                Ok(bet) if bet >= minimum_bet && bet <= chips => return Ok(Some(bet)),
                Ok(_) => {
                    writeln!(
                        self.writer,
                        "  {}",
                        format!("Bet between {} and {}.", minimum_bet, chips).red()
                    )
                    .ok();
                }
                Err(_) => {
                    writeln!(self.writer, "  {}", "Enter a whole number of chips, or q to leave.".red()).ok();
                }
            }
        }
    }

    fn decide(&mut self, hand: &Hand, view: &TableView, allowed: &[Action]) -> BlackjackResult<Action> {
        writeln!(
            self.writer,
            "\n  Dealer {}   You {}",
            card_display(&view.upcard),
            hand_display(hand)
        )
        .ok();
        writeln!(self.writer, "  {}", action_menu(allowed).dimmed()).ok();
        loop {
            let answer = prompt("  Action", None, self.reader, self.writer);
            // q or end of input stands the hand so the round can finish.
            if answer.to_lowercase() == "q" {
                return Ok(Action::Stand);
            }
            match Action::parse(&answer) {
                Ok(action) if allowed.contains(&action) => return Ok(action),
                Ok(action) => {
                    writeln!(self.writer, "  {}", format!("You are not allowed to {}.", action).red()).ok();
                }
                Err(_) => {
                    writeln!(self.writer, "  {}", format!("Choose one of: {}", action_menu(allowed)).red()).ok();
                }
            }
        }
    }

    fn insurance(&mut self, hand: &Hand, view: &TableView) -> BlackjackResult<bool> {
        writeln!(
            self.writer,
            "\n  Dealer shows {}   You {}",
            card_display(&view.upcard),
            hand_display(hand)
        )
        .ok();
        Ok(prompt_yn("  Insurance?", "n", self.reader, self.writer).unwrap_or(false))
    }

    fn on_split(&mut self, _parent: HandId, _children: [HandId; 2]) -> BlackjackResult<()> {
        writeln!(self.writer, "  {}", "Split into two hands.".cyan()).ok();
        Ok(())
    }

    fn on_outcome(&mut self, hand: &Hand, outcome: Outcome) -> BlackjackResult<()> {
        writeln!(
            self.writer,
            "  {}  {}  ({} on {})",
            styled_outcome(outcome),
            hand_display(hand),
            outcome.payout(hand.bet),
            hand.bet
        )
        .ok();
        Ok(())
    }

    fn on_insurance_settled(&mut self, settlement: InsuranceSettlement) -> BlackjackResult<()> {
        let line = match settlement {
            InsuranceSettlement::Paid { insurance, .. } => format!("Insurance pays {}.", insurance).green(),
            InsuranceSettlement::Forfeited { insurance } => format!("Insurance of {} lost.", insurance).red(),
            InsuranceSettlement::Declined { .. } => return Ok(()),
        };
        writeln!(self.writer, "  {}", line).ok();
        Ok(())
    }

    fn on_dealer(&mut self, dealer: &Hand) -> BlackjackResult<()> {
        writeln!(self.writer, "  Dealer {}", hand_display(dealer)).ok();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub fn play_command(
    robots: &[StrategyKind],
    config: &TableConfig,
    learner: &LearnerConfig,
    seed: Option<u64>,
) -> BlackjackResult<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    run_interactive_session(&mut reader, &mut writer, robots, config, learner, seed)
}

/// Seat the console player first, then any robots, and deal until the
/// player leaves or runs out of chips.
pub fn run_interactive_session(
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
    robots: &[StrategyKind],
    config: &TableConfig,
    learner: &LearnerConfig,
    seed: Option<u64>,
) -> BlackjackResult<()> {
    writeln!(writer).ok();
    writeln!(writer, "{}", "Blackjack".cyan().bold()).ok();
    writeln!(
        writer,
        "{} decks, minimum bet {}, dealer stands on soft 17. Type {} at the bet prompt to leave.",
        config.decks,
        config.minimum_bet,
        "'q'".bold()
    )
    .ok();

    let results = {
        let mut table = Table::new(config.clone(), config.shoe(seed)?)?;
        table.seat(Human::new("you", &mut *reader, &mut *writer));
        for (i, kind) in robots.iter().enumerate() {
            let name = format!("{} {}", kind, i + 1);
            match kind {
                StrategyKind::Basic => table.seat(BasicStrategy::new(&name)),
                StrategyKind::Counter => table.seat(CardCounter::new(&name)),
                StrategyKind::Learner => table.seat(ReinforcementLearner::new(&name, learner.clone())?),
            };
        }
        loop {
            if !table.play_round()?.seated.contains(&0) {
                break;
            }
        }
        table
            .into_seats()
            .iter()
            .map(|seat| SessionResult {
                name: seat.name().to_string(),
                table: 0,
                rounds: seat.stats.rounds,
                starting_chips: config.starting_chips,
                final_chips: seat.chips,
                stats: seat.stats.clone(),
                training_examples: 0,
            })
            .collect::<Vec<_>>()
    };

    writeln!(writer, "\n{}", results_table(&results)).ok();
    writeln!(writer, "\n{}\n", "Thanks for playing.".cyan().bold()).ok();
    Ok(())
}
