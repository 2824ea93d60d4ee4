//! Dialogue Manager module: the conversation engine behind the feedback and
//! word browsing flows.
//!
//! Every entry point locks the chat's session for the whole transition, so a
//! transition (including its cleanup side effects) completes before the next
//! event for the same chat is looked at. Outbound calls are best-effort: a
//! failed call is logged and the transition continues with its next step.

use std::sync::{Arc, Weak};
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tracing::{debug, info, warn};

use crate::cards::CardSource;
use crate::dialogue::{ActiveFlow, ConversationState};
use crate::localization::{t, t_args};
use crate::session::{ChatSession, SessionSnapshot, SessionStore};
use crate::transport::{Controls, Transport, TransportResult};

use super::ui_builder::{format_user_info, UserInfo};

/// A button press as seen by the engine
#[derive(Clone, Debug)]
pub struct Interaction {
    /// Id used to acknowledge the press
    pub id: String,
    /// Message carrying the pressed button, if Telegram still knows it
    pub message: Option<MessageId>,
}

/// Owner of all chat sessions and of the transitions between their states
pub struct ConversationEngine {
    transport: Arc<dyn Transport>,
    cards: Arc<dyn CardSource>,
    sessions: SessionStore,
    maintainer_chat: ChatId,
    timeout: Duration,
    this: Weak<ConversationEngine>,
}

impl ConversationEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        cards: Arc<dyn CardSource>,
        maintainer_chat: ChatId,
        timeout: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            transport,
            cards,
            sessions: SessionStore::new(),
            maintainer_chat,
            timeout,
            this: this.clone(),
        })
    }

    pub fn maintainer_chat(&self) -> ChatId {
        self.maintainer_chat
    }

    /// Current state of a chat, `None` if the chat never interacted
    pub async fn snapshot(&self, chat: ChatId) -> Option<SessionSnapshot> {
        self.sessions.snapshot(chat).await
    }

    pub async fn active_flow(&self, chat: ChatId) -> ActiveFlow {
        self.snapshot(chat)
            .await
            .map(|s| s.state.active_flow())
            .unwrap_or_default()
    }

    // Feedback flow

    /// `/feedback`: enter the feedback flow, discarding whatever the chat
    /// was doing before.
    pub async fn start_feedback(&self, chat: ChatId) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;
        info!(chat_id = %chat, previous = ?session.active_flow(), "Feedback conversation started");

        match session.active_flow() {
            // Re-entry restarts the flow without a cancellation notice
            ActiveFlow::Feedback | ActiveFlow::WordBrowsing => {
                self.end_flow(chat, &mut session).await;
            }
            ActiveFlow::None => {}
        }

        self.send_logged(chat, &t("feedback-start"), None, None, "feedback instructions")
            .await;

        session.state = ConversationState::FeedbackReceiving;
        self.arm_timeout(chat, &mut session);
        session.active_flow()
    }

    /// Non-command message from the user.
    ///
    /// While waiting for feedback the message becomes the feedback
    /// candidate; while waiting for confirmation the prompt is sent again.
    /// Anywhere else the message is not routed to any flow.
    pub async fn handle_message(&self, chat: ChatId, message: MessageId) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        match session.state {
            ConversationState::FeedbackReceiving => {
                debug!(chat_id = %chat, message_id = %message, "Feedback candidate received");
                let prompt = self.send_confirmation_prompt(chat, message).await;
                session.state = ConversationState::FeedbackAwaitingConfirmation {
                    pending_message: message,
                    confirmation_control: prompt,
                };
                self.arm_timeout(chat, &mut session);
            }
            ConversationState::FeedbackAwaitingConfirmation {
                pending_message, ..
            } => {
                debug!(chat_id = %chat, "Input not recognized while awaiting confirmation, prompting again");
                let mut old_prompt = session.state.take_live_control();
                self.cleanup_control(chat, &mut old_prompt).await;
                let prompt = self.send_confirmation_prompt(chat, pending_message).await;
                session.state = ConversationState::FeedbackAwaitingConfirmation {
                    pending_message,
                    confirmation_control: prompt,
                };
                self.arm_timeout(chat, &mut session);
            }
            ConversationState::Idle | ConversationState::CardShown { .. } => {
                debug!(chat_id = %chat, flow = ?session.active_flow(), "Message outside of a conversation ignored");
            }
        }

        session.active_flow()
    }

    /// Yes button under the confirmation prompt: relay the feedback.
    pub async fn confirm_feedback(
        &self,
        chat: ChatId,
        interaction: &Interaction,
        submitter: &UserInfo,
    ) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        let Some(pending) = self.live_feedback(&session, interaction) else {
            self.acknowledge_stale(chat, interaction, "confirm").await;
            return session.active_flow();
        };

        info!(chat_id = %chat, message_id = %pending, "Feedback confirmed, forwarding to maintainer");

        let notice = t_args("maintainer-feedback", &[("user_info", &format_user_info(submitter))]);
        self.send_logged(self.maintainer_chat, &notice, None, None, "maintainer feedback notice")
            .await;
        self.forward_logged(chat, self.maintainer_chat, pending, "feedback to maintainer")
            .await;
        self.acknowledge_logged(chat, interaction).await;
        self.send_logged(chat, &t("feedback-sent"), None, None, "feedback success")
            .await;
        // Show the user what was sent
        self.forward_logged(chat, chat, pending, "feedback copy to user")
            .await;

        self.end_flow(chat, &mut session).await;
        session.active_flow()
    }

    /// No button under the confirmation prompt.
    pub async fn reject_feedback(&self, chat: ChatId, interaction: &Interaction) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        if self.live_feedback(&session, interaction).is_none() {
            self.acknowledge_stale(chat, interaction, "reject").await;
            return session.active_flow();
        }

        self.cancel_flow(chat, &mut session, Some(interaction)).await;
        session.active_flow()
    }

    /// Pending feedback message, if the pressed button belongs to the live
    /// confirmation prompt
    fn live_feedback(&self, session: &ChatSession, interaction: &Interaction) -> Option<MessageId> {
        match session.state {
            ConversationState::FeedbackAwaitingConfirmation {
                pending_message,
                confirmation_control: Some(control),
            } if interaction.message.map_or(true, |m| m == control) => Some(pending_message),
            _ => None,
        }
    }

    async fn send_confirmation_prompt(&self, chat: ChatId, pending: MessageId) -> Option<MessageId> {
        match self
            .transport
            .send_text(
                chat,
                &t("feedback-confirm-prompt"),
                Some(pending),
                Some(Controls::FeedbackConfirmation),
            )
            .await
        {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                warn!(chat_id = %chat, error = %e, "Failed to send feedback confirmation prompt");
                None
            }
        }
    }

    // Word browsing flow

    /// `/get`: send a random card with Resend/Next buttons.
    pub async fn start_browsing(&self, chat: ChatId) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        match session.active_flow() {
            ActiveFlow::Feedback => self.cancel_flow(chat, &mut session, None).await,
            ActiveFlow::WordBrowsing => self.end_flow(chat, &mut session).await,
            ActiveFlow::None => {}
        }

        self.show_new_card(chat, &mut session).await;
        session.active_flow()
    }

    /// Resend-current button: swap the photo of the card in place.
    pub async fn resend_card(&self, chat: ChatId, interaction: &Interaction) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        let Some(card_message) = self.live_card(&session, interaction) else {
            self.acknowledge_stale(chat, interaction, "resend").await;
            return session.active_flow();
        };

        let card = self.cards.draw();
        info!(chat_id = %chat, message_id = %card_message, card = %card.name, "Replacing current card");
        if let Err(e) = self
            .transport
            .edit_message_media(chat, card_message, &card, Some(Controls::CardBrowsing))
            .await
        {
            warn!(chat_id = %chat, error = %e, "Failed to replace card media");
        }
        self.acknowledge_logged(chat, interaction).await;

        self.arm_timeout(chat, &mut session);
        session.active_flow()
    }

    /// Send-next button: keep the current card and send another one below.
    pub async fn next_card(&self, chat: ChatId, interaction: &Interaction) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        if self.live_card(&session, interaction).is_none() {
            self.acknowledge_stale(chat, interaction, "next").await;
            return session.active_flow();
        }

        self.end_flow(chat, &mut session).await;
        self.show_new_card(chat, &mut session).await;
        self.acknowledge_logged(chat, interaction).await;
        session.active_flow()
    }

    fn live_card(&self, session: &ChatSession, interaction: &Interaction) -> Option<MessageId> {
        match session.state {
            ConversationState::CardShown { last_card_control }
                if interaction.message.map_or(true, |m| m == last_card_control) =>
            {
                Some(last_card_control)
            }
            _ => None,
        }
    }

    async fn show_new_card(&self, chat: ChatId, session: &mut ChatSession) {
        let card = self.cards.draw();
        info!(chat_id = %chat, card = %card.name, "Sending word card");

        match self
            .transport
            .send_photo(chat, &card, Some(Controls::CardBrowsing))
            .await
        {
            Ok(message) => {
                session.state = ConversationState::CardShown {
                    last_card_control: message,
                };
                self.arm_timeout(chat, session);
            }
            Err(e) => {
                warn!(chat_id = %chat, error = %e, "Failed to send word card");
                session.state = ConversationState::Idle;
                session.advance_generation();
            }
        }
    }

    // Shared exits

    /// Any command other than a flow entry (or `/cancel`) interrupts the
    /// current flow.
    pub async fn interrupt(&self, chat: ChatId) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        match session.active_flow() {
            ActiveFlow::Feedback => self.cancel_flow(chat, &mut session, None).await,
            ActiveFlow::WordBrowsing => {
                info!(chat_id = %chat, "Word browsing conversation canceled");
                self.end_flow(chat, &mut session).await;
            }
            ActiveFlow::None => {}
        }

        session.active_flow()
    }

    /// Scheduled inactivity timeout armed for `generation`.
    ///
    /// Does nothing when the chat has moved on since the timeout was armed.
    pub async fn handle_timeout(&self, chat: ChatId, generation: u64) -> ActiveFlow {
        let mut session = self.sessions.lock(chat).await;

        if session.generation != generation {
            debug!(chat_id = %chat, generation, current = session.generation, "Stale timeout ignored");
            return session.active_flow();
        }
        // This may be the timeout task itself; dropping the handle keeps the
        // task from aborting its own transition
        session.timeout = None;

        match session.active_flow() {
            ActiveFlow::Feedback => {
                info!(chat_id = %chat, "Feedback conversation timeout");
                self.send_logged(chat, &t("feedback-timeout"), None, None, "feedback timeout")
                    .await;
                self.end_flow(chat, &mut session).await;
            }
            ActiveFlow::WordBrowsing => {
                info!(chat_id = %chat, "Word browsing conversation timeout");
                self.end_flow(chat, &mut session).await;
            }
            ActiveFlow::None => {}
        }

        session.active_flow()
    }

    /// Leave the feedback flow with a cancellation notice
    async fn cancel_flow(
        &self,
        chat: ChatId,
        session: &mut ChatSession,
        interaction: Option<&Interaction>,
    ) {
        info!(chat_id = %chat, "Feedback conversation canceled");
        if let Some(interaction) = interaction {
            self.acknowledge_logged(chat, interaction).await;
        }
        self.send_logged(chat, &t("feedback-cancelled"), None, None, "cancellation notice")
            .await;
        self.end_flow(chat, session).await;
    }

    /// Strip the live control of the current flow and return to idle
    async fn end_flow(&self, chat: ChatId, session: &mut ChatSession) {
        let mut control = session.state.take_live_control();
        self.cleanup_control(chat, &mut control).await;
        session.state = ConversationState::Idle;
        session.advance_generation();
    }

    /// Remove the inline keyboard of the message in `slot` and clear it.
    ///
    /// The slot is cleared even when the edit fails; calling this on an
    /// empty slot does nothing.
    pub async fn cleanup_control(&self, chat: ChatId, slot: &mut Option<MessageId>) {
        if let Some(message) = slot.take() {
            if let Err(e) = self
                .transport
                .edit_message_controls(chat, message, None)
                .await
            {
                warn!(chat_id = %chat, message_id = %message, error = %e, "Failed to remove inline keyboard");
            }
        }
    }

    // Helpers

    fn arm_timeout(&self, chat: ChatId, session: &mut ChatSession) {
        let generation = session.advance_generation();
        let engine = self.this.clone();
        let timeout = self.timeout;

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(engine) = engine.upgrade() {
                engine.handle_timeout(chat, generation).await;
            }
        });
        session.timeout = Some(task.abort_handle());
    }

    async fn send_logged(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        controls: Option<Controls>,
        what: &str,
    ) -> Option<MessageId> {
        log_failure(
            chat,
            what,
            self.transport.send_text(chat, text, reply_to, controls).await,
        )
    }

    async fn forward_logged(&self, from: ChatId, to: ChatId, message: MessageId, what: &str) {
        log_failure(
            from,
            what,
            self.transport.forward_message(from, to, message).await,
        );
    }

    async fn acknowledge_logged(&self, chat: ChatId, interaction: &Interaction) {
        log_failure(
            chat,
            "callback acknowledgement",
            self.transport.acknowledge_interaction(&interaction.id).await,
        );
    }

    async fn acknowledge_stale(&self, chat: ChatId, interaction: &Interaction, action: &str) {
        info!(chat_id = %chat, action, "Stale interaction acknowledged without action");
        self.acknowledge_logged(chat, interaction).await;
    }
}

fn log_failure<T>(chat: ChatId, what: &str, result: TransportResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(chat_id = %chat, error = %e, "Failed to send {what}");
            None
        }
    }
}
