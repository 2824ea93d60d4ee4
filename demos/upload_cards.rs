//! # Card Upload Tool
//!
//! Uploads word card screenshots to the contact chat and stores the Telegram
//! file ids in the JSON file the bot builds its card pool from. With
//! `--verify` every stored card is sent again by its file id instead.
//!
//! Reads `BOT_TOKEN` and `CONTACT_CHAT_ID` from the environment or `.env`.
//!
//! ```text
//! cargo run --example upload_cards -- screens/vertical screens/horizontal
//! cargo run --example upload_cards -- --verify
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tracing::{info, warn};

use lieksika::cards::{card_image_paths, largest_photo, Card, CardPool};
use lieksika::config::{Credentials, DEFAULT_CARDS_PATH};

#[derive(Parser)]
#[command(name = "upload_cards")]
#[command(about = "Upload word cards and store their Telegram file ids", long_about = None)]
struct Args {
    /// Directories with .png, .jpg or .jpeg card screenshots
    dirs: Vec<PathBuf>,

    /// Card pool file to write, or to check with --verify
    #[arg(short, long, default_value = DEFAULT_CARDS_PATH)]
    output: PathBuf,

    /// Resend every stored card by file id instead of uploading
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    let credentials = Credentials::from_env()?;
    let bot = Bot::new(credentials.token);
    let chat = ChatId(credentials.contact_chat_id);

    if args.verify {
        verify(&bot, chat, &args.output).await
    } else {
        upload(&bot, chat, &args.dirs, &args.output).await
    }
}

async fn upload(bot: &Bot, chat: ChatId, dirs: &[PathBuf], output: &Path) -> Result<()> {
    if dirs.is_empty() {
        anyhow::bail!("No card directories given");
    }

    let mut cards = Vec::new();
    for dir in dirs {
        let paths = card_image_paths(dir)?;
        info!(dir = %dir.display(), count = paths.len(), "Uploading card directory");

        for path in paths {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("No file name in {}", path.display()))?;

            let sent = bot
                .send_photo(chat, InputFile::file(path.clone()))
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            let photo = sent
                .photo()
                .and_then(largest_photo)
                .with_context(|| format!("Telegram returned no photo for {name}"))?;

            info!(card = %name, width = photo.width, height = photo.height, "Card uploaded");
            cards.push(Card {
                name,
                file_id: photo.file.id.0.clone(),
            });
        }
    }

    let pool = CardPool::new(cards)?;
    pool.save(output)?;
    info!(cards = pool.len(), path = %output.display(), "Card file ids stored");
    Ok(())
}

async fn verify(bot: &Bot, chat: ChatId, pool_path: &Path) -> Result<()> {
    let pool = CardPool::load(pool_path)?;
    let mut failed = 0;

    for card in pool.cards() {
        match bot
            .send_photo(chat, InputFile::file_id(FileId(card.file_id.clone())))
            .await
        {
            Ok(_) => info!(card = %card.name, file_id = %card.file_id, "Card resent by file id"),
            Err(e) => {
                failed += 1;
                warn!(card = %card.name, error = %e, "Failed to resend card");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} cards could not be resent", pool.len());
    }
    info!(cards = pool.len(), "All cards resent");
    Ok(())
}
