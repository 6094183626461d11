//! The `spaced validate` command.

use std::path::PathBuf;

use anyhow::Result;

use spaced_core::deck::{load_deck, load_deck_directory, validate_deck};

use super::Session;

pub fn execute(session: &Session, deck: Option<PathBuf>) -> Result<()> {
    let path = session.deck_path(deck);
    let decks = if path.is_dir() {
        load_deck_directory(&path)?
    } else {
        vec![load_deck(&path)?]
    };

    let mut total_warnings = 0;

    for deck in &decks {
        println!("Deck: {} ({} items)", deck.name, deck.items.len());

        let warnings = validate_deck(deck);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All decks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
