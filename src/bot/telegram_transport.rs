//! Telegram implementation of [`Transport`] on top of `teloxide::Bot`.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, FileId, InputFile, InputMedia, InputMediaPhoto, MessageId, ReplyParameters,
};

use crate::cards::Card;
use crate::transport::{Controls, Transport, TransportResult};

use super::ui_builder::create_keyboard;

/// Thin wrapper around `teloxide::Bot`
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying bot for direct API use when needed
    pub fn inner(&self) -> &Bot {
        &self.bot
    }
}

fn card_file(card: &Card) -> InputFile {
    InputFile::file_id(FileId(card.file_id.clone()))
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId> {
        let mut request = self.bot.send_message(chat, text);
        if let Some(message) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(message));
        }
        if let Some(controls) = controls {
            request = request.reply_markup(create_keyboard(controls));
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId> {
        let mut request = self.bot.send_photo(chat, card_file(card));
        if let Some(controls) = controls {
            request = request.reply_markup(create_keyboard(controls));
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn edit_message_controls(
        &self,
        chat: ChatId,
        message: MessageId,
        controls: Option<Controls>,
    ) -> TransportResult<()> {
        let mut request = self.bot.edit_message_reply_markup(chat, message);
        if let Some(controls) = controls {
            request = request.reply_markup(create_keyboard(controls));
        }
        request.await?;
        Ok(())
    }

    async fn edit_message_media(
        &self,
        chat: ChatId,
        message: MessageId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<()> {
        let media = InputMedia::Photo(InputMediaPhoto::new(card_file(card)));
        let mut request = self.bot.edit_message_media(chat, message, media);
        if let Some(controls) = controls {
            request = request.reply_markup(create_keyboard(controls));
        }
        request.await?;
        Ok(())
    }

    async fn forward_message(
        &self,
        from_chat: ChatId,
        to_chat: ChatId,
        message: MessageId,
    ) -> TransportResult<()> {
        self.bot.forward_message(to_chat, from_chat, message).await?;
        Ok(())
    }

    async fn acknowledge_interaction(&self, interaction_id: &str) -> TransportResult<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(interaction_id.to_string()))
            .await?;
        Ok(())
    }
}
