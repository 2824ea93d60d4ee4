//! # Lieksika Telegram Bot
//!
//! A Telegram bot that sends random Belarusian word cards and relays user
//! feedback to the maintainer through two per-chat conversations.

pub mod bot;
pub mod cards;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod joke;
pub mod localization;
pub mod session;
pub mod transport;
