//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t, t_args};

// Import dialogue types
use crate::dialogue::{ActiveFlow, Command};

use super::context::BotContext;
use super::ui_builder::{format_user_info, UserInfo};

/// Inbound message reduced to what routing needs
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    pub user: Option<UserInfo>,
}

impl IncomingMessage {
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat: msg.chat.id,
            message_id: msg.id,
            text: msg.text().map(str::to_string),
            user: msg.from.as_ref().map(UserInfo::from_user),
        }
    }

    pub fn command(&self) -> Option<Command> {
        self.text.as_deref().and_then(Command::parse)
    }
}

/// Route an incoming message to a flow entry, the active flow, or a plain
/// command reply. Returns the flow the chat ends up in.
pub async fn handle_incoming(ctx: &BotContext, incoming: &IncomingMessage) -> Result<ActiveFlow> {
    let chat = incoming.chat;

    let command = match incoming.command() {
        Some(command) => command,
        None => return Ok(ctx.engine.handle_message(chat, incoming.message_id).await),
    };
    debug!(chat_id = %chat, command = ?command, "Received command");

    let flow = match command {
        Command::Feedback => ctx.engine.start_feedback(chat).await,
        Command::Get => ctx.engine.start_browsing(chat).await,
        _ => {
            // Any other command closes the running conversation first
            let flow = ctx.engine.interrupt(chat).await;
            handle_command(ctx, incoming, &command).await?;
            flow
        }
    };

    Ok(flow)
}

async fn handle_command(ctx: &BotContext, incoming: &IncomingMessage, command: &Command) -> Result<()> {
    let chat = incoming.chat;

    match command {
        Command::Start => {
            send_about(ctx, chat).await?;
            send_help(ctx, chat).await?;

            if let Some(user) = &incoming.user {
                info!(chat_id = %chat, user_id = user.id, "New user started the bot");
                let notice = t_args("maintainer-new-user", &[("user_info", &format_user_info(user))]);
                if let Err(e) = ctx
                    .transport
                    .send_text(ctx.maintainer_chat(), &notice, None, None)
                    .await
                {
                    warn!(chat_id = %chat, error = %e, "Failed to notify maintainer about new user");
                }
            }
        }
        Command::About => send_about(ctx, chat).await?,
        Command::Help => send_help(ctx, chat).await?,
        Command::Joke => {
            let joke = match ctx.jokes.fetch_joke().await {
                Ok(joke) => joke,
                Err(e) => {
                    warn!(chat_id = %chat, error = %e, "Failed to fetch joke");
                    t("joke-unavailable")
                }
            };
            ctx.transport.send_text(chat, &joke, None, None).await?;
        }
        Command::Unknown(text) => {
            info!(chat_id = %chat, command = %text, "Unrecognized command");
            ctx.transport
                .send_text(chat, &t_args("unknown-command", &[("command", text)]), None, None)
                .await?;
            send_help(ctx, chat).await?;
        }
        // Closing the running conversation is all /cancel does
        Command::Cancel => {}
        Command::Get | Command::Feedback => {}
    }

    Ok(())
}

async fn send_about(ctx: &BotContext, chat: ChatId) -> Result<()> {
    ctx.transport.send_text(chat, &t("about-text"), None, None).await?;
    Ok(())
}

async fn send_help(ctx: &BotContext, chat: ChatId) -> Result<()> {
    ctx.transport.send_text(chat, &t("help-text"), None, None).await?;
    Ok(())
}

pub async fn message_handler(msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    let incoming = IncomingMessage::from_message(&msg);

    if let Err(e) = handle_incoming(&ctx, &incoming).await {
        ctx.report_error(incoming.user.as_ref(), &e, &format!("{msg:#?}"))
            .await;
    }

    Ok(())
}

/// Edits of already sent messages never drive a conversation
pub async fn edited_message_handler(msg: Message) -> Result<()> {
    debug!(chat_id = %msg.chat.id, message_id = %msg.id, "Ignoring edit update");
    Ok(())
}
