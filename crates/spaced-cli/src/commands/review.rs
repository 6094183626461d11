//! The `spaced review` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use spaced_core::deck::save_deck;
use spaced_core::model::Grade;

use super::{format_time, load_item, resolve_now, scheduling_error, Session};

pub fn execute(
    session: &Session,
    deck: Option<PathBuf>,
    item_id: String,
    grade: String,
    now: Option<String>,
) -> Result<()> {
    let grade: Grade = grade.parse()?;
    let path = session.deck_path(deck);
    let (mut deck, index) = load_item(&path, &item_id)?;
    let now = resolve_now(now.as_deref())?;

    let item = &mut deck.items[index];
    let state = item
        .review
        .as_ref()
        .with_context(|| format!("item '{item_id}' has no review state"))?;
    let next = session
        .scheduler
        .review_once(state, grade, now)
        .map_err(|e| scheduling_error(&item_id, e))?;

    println!(
        "Reviewed '{}' as {grade}: {} -> {}, next due {} ({:.2} days)",
        item.title,
        state.state,
        next.state,
        format_time(next.due),
        next.scheduled_days,
    );

    item.review = Some(next);
    item.updated_at = Some(now);
    save_deck(&path, &deck)?;

    Ok(())
}
