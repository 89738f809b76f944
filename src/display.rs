use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use itertools::Itertools;

use crate::cards::{Card, Hand, Suit};
use crate::error::BlackjackResult;
use crate::payout::Outcome;
use crate::simulation::SessionResult;
use crate::strategy::{chart, Play};

pub fn card_display(card: &Card) -> String {
    let text = card.pretty();
    match card.suit {
        Suit::Spades => text.white().to_string(),
        Suit::Hearts => text.red().to_string(),
        Suit::Diamonds => text.blue().to_string(),
        Suit::Clubs => text.green().to_string(),
    }
}

pub fn hand_display(hand: &Hand) -> String {
    let cards = hand.cards.iter().map(card_display).join(" ");
    let total = if hand.is_soft() && hand.best_value() < 21 {
        format!("soft {}", hand.best_value())
    } else {
        hand.best_value().to_string()
    };
    format!("{}  ({})", cards, total.bold())
}

pub fn styled_outcome(outcome: Outcome) -> String {
    let text = outcome.to_string().to_uppercase();
    match outcome {
        Outcome::Blackjack => text.yellow().bold().to_string(),
        Outcome::Won => text.green().bold().to_string(),
        Outcome::Push | Outcome::Insured => text.bold().to_string(),
        Outcome::Surrender => text.dimmed().bold().to_string(),
        Outcome::Lost | Outcome::Bust => text.red().bold().to_string(),
    }
}

fn signed_chips(value: i64) -> String {
    let text = format!("{:+}", value);
    if value >= 0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Summary of simulated sessions, one row per table.
pub fn results_table(results: &[SessionResult]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Seat".bold().to_string()),
        Cell::new("Table"),
        Cell::new("Rounds"),
        Cell::new("Hands"),
        Cell::new("Won"),
        Cell::new("BJ"),
        Cell::new("Push"),
        Cell::new("Lost"),
        Cell::new("Bust"),
        Cell::new("Surr."),
        Cell::new("Chips"),
        Cell::new("Net"),
        Cell::new("Net/100"),
    ]);
    for r in results {
        let s = &r.stats;
        table.add_row(vec![
            Cell::new(&r.name),
            Cell::new(r.table).set_alignment(CellAlignment::Right),
            Cell::new(r.rounds).set_alignment(CellAlignment::Right),
            Cell::new(s.hands).set_alignment(CellAlignment::Right),
            Cell::new(s.wins).set_alignment(CellAlignment::Right),
            Cell::new(s.blackjacks).set_alignment(CellAlignment::Right),
            Cell::new(s.pushes).set_alignment(CellAlignment::Right),
            Cell::new(s.losses).set_alignment(CellAlignment::Right),
            Cell::new(s.busts).set_alignment(CellAlignment::Right),
            Cell::new(s.surrenders).set_alignment(CellAlignment::Right),
            Cell::new(r.final_chips).set_alignment(CellAlignment::Right),
            Cell::new(signed_chips(r.net())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", r.net_per_100())).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

fn styled_play(play: Play) -> String {
    let label = play.label();
    match play {
        Play::Hit => label.red().to_string(),
        Play::Stand => label.yellow().to_string(),
        Play::Double | Play::DoubleOrStand => label.cyan().bold().to_string(),
        Play::Split => label.green().bold().to_string(),
        Play::Surrender => label.dimmed().to_string(),
    }
}

fn chart_section(title: &str, rows: Vec<(String, &[Play])>, upcards: &[u8]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec![Cell::new("")];
    for &up in upcards {
        let label = if up == 11 { "A".to_string() } else { up.to_string() };
        header.push(Cell::new(label).set_alignment(CellAlignment::Center));
    }
    table.set_header(header);
    for (label, cells) in rows {
        let mut row = vec![Cell::new(label.bold().to_string())];
        for &play in cells {
            row.push(Cell::new(styled_play(play)).set_alignment(CellAlignment::Center));
        }
        table.add_row(row);
    }
    format!("  {}\n{}", title.bold(), table)
}

/// The basic strategy chart as three grids: hard totals, soft totals, pairs.
pub fn strategy_chart() -> BlackjackResult<String> {
    let chart = chart()?;
    let mut hard: Vec<_> = chart.hard.iter().collect();
    hard.sort_by(|a, b| b.0.cmp(a.0));
    let mut soft: Vec<_> = chart.soft.iter().collect();
    soft.sort_by(|a, b| b.0.cmp(a.0));
    let mut pairs: Vec<_> = chart.pairs.iter().collect();
    pairs.sort_by(|a, b| b.0.cmp(a.0));

    let hard_rows = hard.into_iter().map(|(t, r)| (t.to_string(), r.as_slice())).collect();
    let soft_rows = soft
        .into_iter()
        .map(|(t, r)| (format!("A,{}", t - 11), r.as_slice()))
        .collect();
    let mut pair_rows: Vec<(String, &[Play])> = vec![("A,A".to_string(), chart.aces.as_slice())];
    pair_rows.extend(pairs.into_iter().map(|(t, r)| {
        let card = if *t == 20 { "T".to_string() } else { (t / 2).to_string() };
        (format!("{},{}", card, card), r.as_slice())
    }));

    Ok([
        chart_section("Hard totals", hard_rows, &chart.upcards),
        chart_section("Soft totals", soft_rows, &chart.upcards),
        chart_section("Pairs", pair_rows, &chart.upcards),
    ]
    .join("\n\n"))
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
