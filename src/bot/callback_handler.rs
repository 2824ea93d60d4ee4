//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

// Import dialogue types
use crate::dialogue::{ActiveFlow, CallbackAction};

use super::context::BotContext;
use super::dialogue_manager::Interaction;
use super::ui_builder::UserInfo;

/// Route a button press to the engine. Returns the flow the chat ends up in.
pub async fn handle_interaction(
    ctx: &BotContext,
    chat: ChatId,
    interaction: &Interaction,
    data: Option<&str>,
    user: &UserInfo,
) -> ActiveFlow {
    let engine = &ctx.engine;

    match data.and_then(CallbackAction::parse) {
        Some(CallbackAction::ResendCurrent) => engine.resend_card(chat, interaction).await,
        Some(CallbackAction::SendNext) => engine.next_card(chat, interaction).await,
        Some(CallbackAction::ConfirmFeedback) => {
            engine.confirm_feedback(chat, interaction, user).await
        }
        Some(CallbackAction::RejectFeedback) => engine.reject_feedback(chat, interaction).await,
        None => {
            debug!(chat_id = %chat, data = ?data, "Unrecognized callback payload ignored");
            if let Err(e) = ctx.transport.acknowledge_interaction(&interaction.id).await {
                warn!(chat_id = %chat, error = %e, "Failed to answer callback query");
            }
            engine.active_flow(chat).await
        }
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    // Private chats share their id with the user
    let chat = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));

    let interaction = Interaction {
        id: q.id.0.clone(),
        message: q.message.as_ref().map(|msg| msg.id()),
    };
    let user = UserInfo::from_user(&q.from);

    handle_interaction(&ctx, chat, &interaction, q.data.as_deref(), &user).await;

    Ok(())
}
