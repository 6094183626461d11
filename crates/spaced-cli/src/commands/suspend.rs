//! The `spaced suspend` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use spaced_core::deck::save_deck;

use super::{load_item, Session};

pub fn execute(session: &Session, deck: Option<PathBuf>, item_id: String, off: bool) -> Result<()> {
    let path = session.deck_path(deck);
    let (mut deck, index) = load_item(&path, &item_id)?;

    let item = &mut deck.items[index];
    let review = item
        .review
        .as_mut()
        .with_context(|| format!("item '{item_id}' has no review state"))?;
    review.set_suspended(!off);

    if off {
        println!("Resumed '{}'", item.title);
    } else {
        println!("Suspended '{}'", item.title);
    }

    save_deck(&path, &deck)?;
    Ok(())
}
