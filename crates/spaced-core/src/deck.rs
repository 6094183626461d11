//! Deck files.
//!
//! A deck is a named list of items stored as TOML or JSON. This is the
//! simple file-backed persistence the CLI uses; the scheduling and query
//! modules never touch the filesystem.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Item;

/// A collection of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Deck {
    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }
}

/// On-disk encoding, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFormat {
    Toml,
    Json,
}

impl DeckFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(DeckFormat::Toml),
            Some("json") => Ok(DeckFormat::Json),
            _ => anyhow::bail!(
                "unsupported deck file (expected .toml or .json): {}",
                path.display()
            ),
        }
    }
}

/// Load a deck file.
pub fn load_deck(path: &Path) -> Result<Deck> {
    let format = DeckFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file: {}", path.display()))?;

    parse_deck_str(&content, format)
        .with_context(|| format!("failed to parse deck: {}", path.display()))
}

/// Parse deck contents (useful for testing).
pub fn parse_deck_str(content: &str, format: DeckFormat) -> Result<Deck> {
    let deck = match format {
        DeckFormat::Toml => toml::from_str(content)?,
        DeckFormat::Json => serde_json::from_str(content)?,
    };
    Ok(deck)
}

/// Write a deck back in the format its extension names.
pub fn save_deck(path: &Path, deck: &Deck) -> Result<()> {
    let content = match DeckFormat::from_path(path)? {
        DeckFormat::Toml => toml::to_string_pretty(deck).context("failed to encode deck as TOML")?,
        DeckFormat::Json => {
            serde_json::to_string_pretty(deck).context("failed to encode deck as JSON")?
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write deck file: {}", path.display()))?;

    tracing::debug!(items = deck.items.len(), "saved deck to {}", path.display());
    Ok(())
}

/// Recursively load every `.toml` and `.json` deck under a directory.
pub fn load_deck_directory(dir: &Path) -> Result<Vec<Deck>> {
    let mut decks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            decks.extend(load_deck_directory(&path)?);
        } else if DeckFormat::from_path(&path).is_ok() {
            match load_deck(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(decks)
}

/// A warning from deck validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    pub message: String,
}

/// Validate a deck for common issues.
pub fn validate_deck(deck: &Deck) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for item in &deck.items {
        if !seen_ids.insert(item.id.as_str()) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    for item in &deck.items {
        if item.id.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("item '{}' has an empty ID", item.title),
            });
        }
        if item.title.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "title is empty".into(),
            });
        }
    }

    for item in &deck.items {
        let Some(review) = &item.review else {
            continue;
        };
        for violation in review.violations() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("review state: {violation}"),
            });
        }
    }

    warnings
}
