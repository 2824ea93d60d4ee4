//! Messaging transport abstraction.
//!
//! [`Transport`] is what the conversation engine talks to. Production code
//! uses the teloxide implementation in `bot::telegram_transport`; tests plug
//! in a recording double.

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};

use crate::cards::Card;
use crate::errors::TransportError;

pub type TransportResult<T> = Result<T, TransportError>;

/// Inline keyboards the engine attaches to its messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controls {
    /// Yes / No buttons under the feedback confirmation prompt
    FeedbackConfirmation,
    /// Resend-current / Send-next buttons under a word card
    CardBrowsing,
}

/// Outbound operations of the messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message, optionally as a reply and with inline controls.
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId>;

    /// Sends a card photo by its stored file reference.
    async fn send_photo(
        &self,
        chat: ChatId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId>;

    /// Replaces (or with `None`, removes) the inline controls of a message.
    async fn edit_message_controls(
        &self,
        chat: ChatId,
        message: MessageId,
        controls: Option<Controls>,
    ) -> TransportResult<()>;

    /// Swaps the photo of an already sent message in place.
    async fn edit_message_media(
        &self,
        chat: ChatId,
        message: MessageId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<()>;

    async fn forward_message(
        &self,
        from_chat: ChatId,
        to_chat: ChatId,
        message: MessageId,
    ) -> TransportResult<()>;

    /// Answers a button press so the client stops showing a spinner.
    async fn acknowledge_interaction(&self, interaction_id: &str) -> TransportResult<()>;
}
