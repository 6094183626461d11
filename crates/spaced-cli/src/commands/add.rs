//! The `spaced add` command.

use std::path::PathBuf;

use anyhow::Result;
use uuid::Uuid;

use spaced_core::deck::{load_deck, save_deck, Deck};
use spaced_core::model::Item;

use super::{resolve_now, Session};

pub struct AddArgs {
    pub title: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub now: Option<String>,
}

pub fn execute(session: &Session, deck: Option<PathBuf>, args: AddArgs) -> Result<()> {
    let path = session.deck_path(deck);
    let now = resolve_now(args.now.as_deref())?;

    let mut deck = if path.exists() {
        load_deck(&path)?
    } else {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
        tracing::info!("creating new deck at {}", path.display());
        Deck {
            name,
            ..Default::default()
        }
    };

    let mut item = Item::new(Uuid::new_v4().to_string(), args.title, now).with_tags(args.tags);
    if let Some(category) = args.category {
        item = item.with_category(category);
    }
    item.kind = args.kind;

    println!("Added '{}' ({})", item.title, item.id);
    deck.items.push(item);
    save_deck(&path, &deck)?;

    Ok(())
}
