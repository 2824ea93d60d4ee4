//! Conversation state definitions for the feedback and word browsing flows.

use serde::{Deserialize, Serialize};
use teloxide::types::MessageId;

/// Callback payload of the "resend current card" button
pub const CB_RESEND_CURRENT: &str = "0";
/// Callback payload of the "send next card" button
pub const CB_SEND_NEXT: &str = "1";
/// Callback payload of the feedback confirmation button
pub const CB_FEEDBACK_CONFIRM: &str = "2";
/// Callback payload of the feedback rejection button
pub const CB_FEEDBACK_REJECT: &str = "3";

/// Which conversational flow a chat is currently in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveFlow {
    #[default]
    None,
    Feedback,
    WordBrowsing,
}

/// Represents the conversation state of a single chat.
///
/// Every message reference that carries a live inline keyboard lives inside
/// exactly one variant, so a chat can never hold a feedback confirmation
/// control and a card control at the same time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    /// `/feedback` was issued, waiting for the message to relay
    FeedbackReceiving,
    /// Feedback message captured, waiting for the Yes/No answer
    FeedbackAwaitingConfirmation {
        pending_message: MessageId,
        confirmation_control: Option<MessageId>,
    },
    /// A word card with Resend/Next buttons has been sent
    CardShown { last_card_control: MessageId },
}

impl ConversationState {
    pub fn active_flow(&self) -> ActiveFlow {
        match self {
            ConversationState::Idle => ActiveFlow::None,
            ConversationState::FeedbackReceiving
            | ConversationState::FeedbackAwaitingConfirmation { .. } => ActiveFlow::Feedback,
            ConversationState::CardShown { .. } => ActiveFlow::WordBrowsing,
        }
    }

    pub fn pending_feedback_message(&self) -> Option<MessageId> {
        match self {
            ConversationState::FeedbackAwaitingConfirmation {
                pending_message, ..
            } => Some(*pending_message),
            _ => None,
        }
    }

    pub fn confirmation_control(&self) -> Option<MessageId> {
        match self {
            ConversationState::FeedbackAwaitingConfirmation {
                confirmation_control,
                ..
            } => *confirmation_control,
            _ => None,
        }
    }

    pub fn last_card_control(&self) -> Option<MessageId> {
        match self {
            ConversationState::CardShown { last_card_control } => Some(*last_card_control),
            _ => None,
        }
    }

    /// Detach the message whose inline keyboard is still live, if any
    pub fn take_live_control(&mut self) -> Option<MessageId> {
        match self {
            ConversationState::FeedbackAwaitingConfirmation {
                confirmation_control,
                ..
            } => confirmation_control.take(),
            ConversationState::CardShown { .. } => match std::mem::take(self) {
                ConversationState::CardShown { last_card_control } => Some(last_card_control),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Button presses understood by the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    ResendCurrent,
    SendNext,
    ConfirmFeedback,
    RejectFeedback,
}

impl CallbackAction {
    /// Parse the callback payload attached to an inline button
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            CB_RESEND_CURRENT => Some(CallbackAction::ResendCurrent),
            CB_SEND_NEXT => Some(CallbackAction::SendNext),
            CB_FEEDBACK_CONFIRM => Some(CallbackAction::ConfirmFeedback),
            CB_FEEDBACK_REJECT => Some(CallbackAction::RejectFeedback),
            _ => None,
        }
    }

    pub fn as_data(&self) -> &'static str {
        match self {
            CallbackAction::ResendCurrent => CB_RESEND_CURRENT,
            CallbackAction::SendNext => CB_SEND_NEXT,
            CallbackAction::ConfirmFeedback => CB_FEEDBACK_CONFIRM,
            CallbackAction::RejectFeedback => CB_FEEDBACK_REJECT,
        }
    }
}

/// Bot commands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    About,
    Help,
    Joke,
    Get,
    Feedback,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse a message text as a command.
    ///
    /// Returns `None` when the text is not a command. A `@botname` suffix
    /// and any arguments after the command word are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        if name.is_empty() {
            return None;
        }
        let name = name.split('@').next().unwrap_or(name);

        let command = match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "about" => Command::About,
            "help" => Command::Help,
            "joke" => Command::Joke,
            "get" => Command::Get,
            "feedback" => Command::Feedback,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(word.to_string()),
        };
        Some(command)
    }
}
