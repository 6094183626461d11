//! The `spaced query` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use spaced_core::deck::load_deck;
use spaced_core::filter;
use spaced_core::model::Item;
use spaced_core::query::{parse_query, ParsedQuery};

use super::{format_time, resolve_now, Session};

#[derive(Serialize)]
struct QueryRow<'a> {
    #[serde(flatten)]
    item: &'a Item,
    retrievability: f64,
}

#[derive(Serialize)]
struct ExplainedOutput<'a> {
    query: &'a ParsedQuery,
    items: Vec<QueryRow<'a>>,
}

pub fn execute(
    session: &Session,
    deck: Option<PathBuf>,
    query: String,
    now: Option<String>,
    format: String,
    explain: bool,
) -> Result<()> {
    let path = session.deck_path(deck);
    let deck = load_deck(&path)?;
    let now = resolve_now(now.as_deref())?;

    let parsed = parse_query(Some(&query));
    tracing::debug!(?parsed, "parsed query");

    let selected = filter::apply(&session.scheduler, &deck.items, &parsed, now);
    let rows: Vec<QueryRow> = selected
        .into_iter()
        .map(|item| QueryRow {
            item,
            retrievability: session
                .scheduler
                .retrievability_now(item.review.as_ref(), now),
        })
        .collect();

    match format.as_str() {
        "json" => {
            let json = if explain {
                serde_json::to_string_pretty(&ExplainedOutput {
                    query: &parsed,
                    items: rows,
                })?
            } else {
                serde_json::to_string_pretty(&rows)?
            };
            println!("{json}");
        }
        "table" => {
            if explain {
                print_explanation(&parsed);
            }
            print_table(&rows);
            println!("{} item(s) matched.", rows.len());
        }
        other => anyhow::bail!("unknown format: {other} (expected table or json)"),
    }

    Ok(())
}

fn print_explanation(query: &ParsedQuery) {
    if query.is_empty() {
        println!("Query: (empty, matches everything)");
        return;
    }
    if !query.tags.is_empty() {
        println!("Tags: {}", query.tags.join(", "));
    }
    for (key, values) in &query.ops {
        println!("Filter: {key} = {}", values.join(" | "));
    }
    if let Some(order) = &query.order {
        println!("Order: {order}");
    }
    println!();
}

fn print_table(rows: &[QueryRow]) {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "State", "Due", "Stability", "Recall"]);

    for row in rows {
        let review = row.item.review.as_ref();
        table.add_row(vec![
            Cell::new(&row.item.id),
            Cell::new(&row.item.title),
            Cell::new(review.map_or("-".to_string(), |r| {
                if r.is_suspended() {
                    format!("{} (suspended)", r.state)
                } else {
                    r.state.to_string()
                }
            })),
            Cell::new(review.map_or("-".to_string(), |r| format_time(r.due))),
            Cell::new(review.map_or("-".to_string(), |r| format!("{:.2}", r.stability))),
            Cell::new(format!("{:.1}%", row.retrievability * 100.0)),
        ]);
    }

    println!("{table}");
}
