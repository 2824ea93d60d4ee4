//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Routes incoming messages and commands
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `dialogue_manager`: The conversation engine driving the feedback and word browsing flows
//! - `ui_builder`: Creates keyboards and formats messages
//! - `telegram_transport`: teloxide implementation of the messaging transport
//! - `context`: Dependencies shared by the handlers

pub mod callback_handler;
pub mod context;
pub mod dialogue_manager;
pub mod message_handler;
pub mod telegram_transport;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{edited_message_handler, message_handler};

pub use context::BotContext;
pub use dialogue_manager::{ConversationEngine, Interaction};
pub use telegram_transport::TelegramTransport;
pub use ui_builder::UserInfo;
