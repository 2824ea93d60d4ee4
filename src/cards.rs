//! # Word Card Pool
//!
//! Word cards are screenshots already uploaded to Telegram. The pool is a
//! JSON object mapping the original file name to the Telegram file id:
//!
//! ```json
//! { "abiakavy.png": "AgACAgIAAxkBAAIC...", "vyraj.png": "AgACAgIAAxkBAAID..." }
//! ```

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use teloxide::types::PhotoSize;

/// File extensions accepted as card screenshots, lowercase
pub const CARD_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A single word card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    /// File name of the screenshot the card was uploaded from
    pub name: String,
    /// Telegram file id used to resend the photo without uploading it again
    pub file_id: String,
}

/// Source of randomly selected cards
pub trait CardSource: Send + Sync {
    /// Draw one card. Draws are independent, so repeats are possible.
    fn draw(&self) -> Card;
}

/// Fixed, non-empty pool of cards with uniform selection
#[derive(Clone, Debug)]
pub struct CardPool {
    cards: Vec<Card>,
}

impl CardPool {
    /// Build a pool from cards. Fails on an empty list.
    pub fn new(cards: Vec<Card>) -> Result<Self> {
        if cards.is_empty() {
            anyhow::bail!("Card pool is empty");
        }
        Ok(Self { cards })
    }

    /// Parse the `{ name: file_id }` JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        // BTreeMap keeps the pool order stable across restarts
        let entries: BTreeMap<String, String> =
            serde_json::from_str(json).context("Card file is not a JSON object of strings")?;

        let cards = entries
            .into_iter()
            .map(|(name, file_id)| Card { name, file_id })
            .collect();

        Self::new(cards)
    }

    /// Load the pool from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read card file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid card file {}", path.display()))
    }

    /// Serialize back into the `{ name: file_id }` document
    pub fn to_json(&self) -> Result<String> {
        let entries: BTreeMap<&str, &str> = self
            .cards
            .iter()
            .map(|card| (card.name.as_str(), card.file_id.as_str()))
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Write the pool to a JSON file that [`CardPool::load`] reads back
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write card file {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// Card screenshots directly inside `dir`, sorted by path
pub fn card_image_paths(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read card directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| CARD_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Largest of the scaled copies Telegram keeps for an uploaded photo.
///
/// Any of them can be resent by id; the largest is stored.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes.iter().max_by_key(|size| size.width.max(size.height))
}

impl CardSource for CardPool {
    fn draw(&self) -> Card {
        self.cards
            .choose(&mut rand::thread_rng())
            .cloned()
            // new() rejects empty pools
            .unwrap_or_else(|| self.cards[0].clone())
    }
}
