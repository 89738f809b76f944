use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::config::Config;
use crate::display::{print_error, print_section, print_success, results_table, strategy_chart};
use crate::error::BlackjackResult;
use crate::learner::LearnerSnapshot;
use crate::play::play_command;
use crate::simulation::{prepare_learner, run_learner, run_scripted_tables, SessionResult, StrategyKind};

#[derive(Parser)]
#[command(
    name = "blackjack",
    version = "1.0.0",
    about = "Blackjack table with scripted, card-counting and self-learning players."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Basic,
    Counter,
    Learner,
}

impl StrategyArg {
    fn kind(self) -> StrategyKind {
        match self {
            StrategyArg::Basic => StrategyKind::Basic,
            StrategyArg::Counter => StrategyKind::Counter,
            StrategyArg::Learner => StrategyKind::Learner,
        }
    }
}

#[derive(clap::Args)]
struct TableArgs {
    /// JSON settings file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of decks in the shoe
    #[arg(long)]
    decks: Option<usize>,
    /// Minimum bet
    #[arg(long = "min-bet")]
    min_bet: Option<u32>,
    /// Starting chips per seat
    #[arg(long)]
    chips: Option<u32>,
    /// Seed for the shoe and the learner
    #[arg(long)]
    seed: Option<u64>,
}

impl TableArgs {
    fn resolve(&self) -> BlackjackResult<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(decks) = self.decks {
            config.table.decks = decks;
        }
        if let Some(min_bet) = self.min_bet {
            config.table.minimum_bet = min_bet;
        }
        if let Some(chips) = self.chips {
            config.table.starting_chips = chips;
        }
        if self.seed.is_some() {
            config.learner.seed = self.seed;
        }
        config.table.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate rounds with a robot player and report the results
    Simulate {
        /// Robot strategy
        #[arg(short, long, default_value = "basic")]
        strategy: StrategyArg,
        /// Rounds per table
        #[arg(short = 'n', long, default_value = "1000")]
        rounds: usize,
        /// Independent tables, played in parallel (scripted strategies only)
        #[arg(short, long, default_value = "1")]
        tables: usize,
        #[command(flatten)]
        table: TableArgs,
        /// Write the learner's network and training data here afterwards
        #[arg(long)]
        save: Option<PathBuf>,
        /// Resume the learner from a saved snapshot
        #[arg(long)]
        load: Option<PathBuf>,
    },
    /// Sit at a table and play from the console
    Play {
        /// Robots to seat beside you, e.g. basic,counter
        #[arg(short, long, value_delimiter = ',')]
        robots: Vec<StrategyArg>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Print the basic strategy chart
    Chart,
    /// Print the default settings as JSON, ready for --config
    Config,
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> BlackjackResult<()> {
    match cli.command {
        Commands::Simulate {
            strategy,
            rounds,
            tables,
            table,
            save,
            load,
        } => cmd_simulate(strategy.kind(), rounds, tables, &table, save, load),
        Commands::Play { robots, table } => {
            let config = table.resolve()?;
            let robots: Vec<StrategyKind> = robots.into_iter().map(StrategyArg::kind).collect();
            play_command(&robots, &config.table, &config.learner, table.seed)
        }
        Commands::Chart => cmd_chart(),
        Commands::Config => {
            println!("{}", Config::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_simulate(
    kind: StrategyKind,
    rounds: usize,
    tables: usize,
    args: &TableArgs,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
) -> BlackjackResult<()> {
    let config = args.resolve()?;

    let results = if kind == StrategyKind::Learner {
        if tables > 1 {
            log::warn!("the learner plays a single table; ignoring --tables {}", tables);
        }
        let snapshot = load.as_deref().map(LearnerSnapshot::load).transpose()?;
        let mut learner = prepare_learner(config.learner.clone(), snapshot)?;
        let result = run_learner(&mut learner, &config.table, rounds, args.seed)?;
        if let Some(report) = learner.last_report() {
            print_section(
                "Last refit",
                &format!(
                    "{} epochs ({}), score {:.4}, {:.2}s",
                    report.epochs,
                    report.stop,
                    report.score,
                    report.elapsed.as_secs_f64()
                ),
            );
        }
        if let Some(path) = save {
            learner.snapshot().save(&path)?;
            print_success(&format!("Saved learner to {}", path.display()));
        }
        vec![result]
    } else {
        if save.is_some() || load.is_some() {
            log::warn!("--save and --load only apply to the learner");
        }
        run_scripted_tables(kind, &config.table, rounds, tables.max(1), args.seed)?
    };

    println!();
    println!("{}", results_table(&results));
    print_totals(&results);
    Ok(())
}

fn print_totals(results: &[SessionResult]) {
    if results.len() < 2 {
        println!();
        return;
    }
    let rounds: usize = results.iter().map(|r| r.rounds).sum();
    let net: i64 = results.iter().map(SessionResult::net).sum();
    let per_100 = if rounds == 0 { 0.0 } else { net as f64 * 100.0 / rounds as f64 };
    let net_str = if net >= 0 {
        format!("{:+}", net).green().bold().to_string()
    } else {
        format!("{:+}", net).red().bold().to_string()
    };
    print_section(
        "All tables",
        &format!("{} rounds, net {} chips ({:.1} per 100 rounds)", rounds, net_str, per_100),
    );
    println!();
}

fn cmd_chart() -> BlackjackResult<()> {
    println!();
    println!("{}", strategy_chart()?);
    println!(
        "\n  {}  H hit, S stand, D double, Ds double else stand, P split",
        "Legend".bold()
    );
    println!();
    Ok(())
}
