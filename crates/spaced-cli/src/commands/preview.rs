//! The `spaced preview` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use super::{format_time, load_item, resolve_now, scheduling_error, Session};

pub fn execute(
    session: &Session,
    deck: Option<PathBuf>,
    item_id: String,
    now: Option<String>,
) -> Result<()> {
    let path = session.deck_path(deck);
    let (deck, index) = load_item(&path, &item_id)?;
    let now = resolve_now(now.as_deref())?;
    let item = &deck.items[index];
    let state = item
        .review
        .as_ref()
        .with_context(|| format!("item '{item_id}' has no review state"))?;

    let preview = session
        .scheduler
        .preview_all(state, now)
        .map_err(|e| scheduling_error(&item_id, e))?;
    let recall = session
        .scheduler
        .try_retrievability_now(Some(state), now)
        .map_err(|e| scheduling_error(&item_id, e))?;

    println!(
        "{} [{}], recall now {:.1}%",
        item.title,
        state.state,
        recall * 100.0
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Grade",
        "State",
        "Due",
        "Interval (days)",
        "Stability",
        "Difficulty",
    ]);
    for (grade, next) in &preview {
        table.add_row(vec![
            Cell::new(grade),
            Cell::new(next.state),
            Cell::new(format_time(next.due)),
            Cell::new(format!("{:.2}", next.scheduled_days)),
            Cell::new(format!("{:.2}", next.stability)),
            Cell::new(format!("{:.2}", next.difficulty)),
        ]);
    }
    println!("{table}");

    Ok(())
}
