//! The `spaced stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use spaced_core::deck::load_deck;
use spaced_core::stats::compute_stats;
use spaced_core::traits::MemoryModel;

use super::{format_time, resolve_now, Session};

pub fn execute(
    session: &Session,
    deck: Option<PathBuf>,
    now: Option<String>,
    format: String,
) -> Result<()> {
    let path = session.deck_path(deck);
    let deck = load_deck(&path)?;
    let now = resolve_now(now.as_deref())?;

    let stats = compute_stats(&session.scheduler, &deck.items, now);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "table" => {
            let config = session.scheduler.config();
            println!("Deck: {}", deck.name);
            println!(
                "Model: {} (retention {:.0}%, max interval {} days)",
                session.scheduler.model().name(),
                config.request_retention * 100.0,
                config.maximum_interval
            );

            let mut table = Table::new();
            table.set_header(vec!["Metric", "Value"]);
            table.add_row(vec![Cell::new("Items"), Cell::new(stats.total)]);
            table.add_row(vec![Cell::new("Reviewable"), Cell::new(stats.with_review)]);
            table.add_row(vec![Cell::new("Due now"), Cell::new(stats.due)]);
            table.add_row(vec![Cell::new("Suspended"), Cell::new(stats.suspended)]);
            for (state, count) in &stats.by_state {
                table.add_row(vec![Cell::new(format!("State: {state}")), Cell::new(count)]);
            }
            table.add_row(vec![Cell::new("Lapses"), Cell::new(stats.total_lapses)]);
            table.add_row(vec![
                Cell::new("Mean recall"),
                Cell::new(
                    stats
                        .mean_retrievability
                        .map_or("-".to_string(), |r| format!("{:.1}%", r * 100.0)),
                ),
            ]);
            table.add_row(vec![
                Cell::new("Next due"),
                Cell::new(stats.next_due.map_or("-".to_string(), format_time)),
            ]);
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: {other} (expected table or json)"),
    }

    Ok(())
}
