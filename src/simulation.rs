use std::fmt;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::{BlackjackError, BlackjackResult};
use crate::learner::{LearnerConfig, LearnerSnapshot, ReinforcementLearner};
use crate::strategy::{BasicStrategy, CardCounter, Strategy};
use crate::table::{SeatStats, Table, TableConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Basic,
    Counter,
    Learner,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Basic => "basic",
            StrategyKind::Counter => "counter",
            StrategyKind::Learner => "learner",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one seat over one simulated session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub name: String,
    pub table: usize,
    pub rounds: usize,
    pub starting_chips: u32,
    pub final_chips: u32,
    pub stats: SeatStats,
    /// Decisions buffered by a learner seat.
    pub training_examples: usize,
}

impl SessionResult {
    pub fn net(&self) -> i64 {
        self.final_chips as i64 - self.starting_chips as i64
    }

    /// Net chips won per hundred rounds played.
    pub fn net_per_100(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.net() as f64 * 100.0 / self.rounds as f64
        }
    }
}

fn table_seed(seed: Option<u64>, table: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add(table as u64))
}

/// One table with a single scripted seat.
pub fn run_scripted(
    kind: StrategyKind,
    config: &TableConfig,
    rounds: usize,
    table: usize,
    seed: Option<u64>,
) -> BlackjackResult<SessionResult> {
    let mut session = Table::new(config.clone(), config.shoe(table_seed(seed, table))?)?;
    match kind {
        StrategyKind::Basic => session.seat(BasicStrategy::default()),
        StrategyKind::Counter => session.seat(CardCounter::default()),
        StrategyKind::Learner => {
            return Err(BlackjackError::InvalidValue(
                "learner tables are played through run_learner".to_string(),
            ))
        }
    };
    let played = session.play(rounds)?;
    let seat = &session.seats()[0];
    Ok(SessionResult {
        name: seat.name().to_string(),
        table,
        rounds: played,
        starting_chips: config.starting_chips,
        final_chips: seat.chips,
        stats: seat.stats.clone(),
        training_examples: 0,
    })
}

/// Independent scripted tables played in parallel.
pub fn run_scripted_tables(
    kind: StrategyKind,
    config: &TableConfig,
    rounds: usize,
    tables: usize,
    seed: Option<u64>,
) -> BlackjackResult<Vec<SessionResult>> {
    let start = Instant::now();
    let results = (0..tables)
        .into_par_iter()
        .map(|table| run_scripted(kind, config, rounds, table, seed))
        .collect::<BlackjackResult<Vec<SessionResult>>>()?;
    log::info!(
        "{} {} table(s) x {} rounds in {:.2}s",
        tables,
        kind,
        rounds,
        start.elapsed().as_secs_f64()
    );
    Ok(results)
}

/// One table with a learner seat. The learner is borrowed so the caller can
/// snapshot it afterwards.
pub fn run_learner(
    learner: &mut ReinforcementLearner,
    config: &TableConfig,
    rounds: usize,
    seed: Option<u64>,
) -> BlackjackResult<SessionResult> {
    let start = Instant::now();
    let mut session = Table::new(config.clone(), config.shoe(seed)?)?;
    session.seat(&mut *learner);
    let played = session.play(rounds)?;
    let seats = session.into_seats();
    let (final_chips, stats) = match seats.first() {
        Some(seat) => (seat.chips, seat.stats.clone()),
        None => (config.starting_chips, SeatStats::default()),
    };
    drop(seats);
    log::info!(
        "learner played {} rounds in {:.2}s, {} decisions buffered",
        played,
        start.elapsed().as_secs_f64(),
        learner.buffers().len()
    );
    Ok(SessionResult {
        name: learner.name().to_string(),
        table: 0,
        rounds: played,
        starting_chips: config.starting_chips,
        final_chips,
        stats,
        training_examples: learner.buffers().len(),
    })
}

/// Build a learner from a snapshot when given one, otherwise from scratch.
pub fn prepare_learner(
    config: LearnerConfig,
    snapshot: Option<LearnerSnapshot>,
) -> BlackjackResult<ReinforcementLearner> {
    match snapshot {
        Some(snapshot) => ReinforcementLearner::from_snapshot("learner", snapshot, config),
        None => ReinforcementLearner::new("learner", config),
    }
}
