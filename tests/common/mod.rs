//! Test doubles for the messaging transport, card source and joke source.
//!
//! [`MockTransport`] records every outbound call and hands out increasing
//! message ids, so tests can assert on exactly what the engine sent.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};

use lieksika::bot::{BotContext, ConversationEngine, UserInfo};
use lieksika::cards::{Card, CardSource};
use lieksika::errors::TransportError;
use lieksika::joke::JokeSource;
use lieksika::transport::{Controls, Transport, TransportResult};

pub const USER_CHAT: ChatId = ChatId(1001);
pub const OTHER_CHAT: ChatId = ChatId(2002);
pub const MAINTAINER_CHAT: ChatId = ChatId(-500);
pub const TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText {
        chat: ChatId,
        text: String,
        reply_to: Option<MessageId>,
        controls: Option<Controls>,
        sent: MessageId,
    },
    SendPhoto {
        chat: ChatId,
        file_id: String,
        controls: Option<Controls>,
        sent: MessageId,
    },
    EditControls {
        chat: ChatId,
        message: MessageId,
        controls: Option<Controls>,
    },
    EditMedia {
        chat: ChatId,
        message: MessageId,
        file_id: String,
        controls: Option<Controls>,
    },
    Forward {
        from: ChatId,
        to: ChatId,
        message: MessageId,
    },
    Acknowledge {
        id: String,
    },
}

/// Transport operations that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SendText,
    SendPhoto,
    EditControls,
    EditMedia,
    Forward,
    Acknowledge,
}

pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Op>>,
    next_id: AtomicI32,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_id: AtomicI32::new(100),
        })
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Texts sent to `chat`, in order
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendText { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn forwards_to(&self, chat: ChatId) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Forward { to, message, .. } if to == chat => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendPhoto { sent, .. } => Some(sent),
                _ => None,
            })
            .collect()
    }

    /// Messages whose controls were removed
    pub fn stripped(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::EditControls {
                    message,
                    controls: None,
                    ..
                } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Acknowledge { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Last confirmation prompt sent to `chat`
    pub fn last_prompt(&self, chat: ChatId) -> Option<(MessageId, Option<MessageId>)> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::SendText {
                chat: c,
                controls: Some(Controls::FeedbackConfirmation),
                sent,
                reply_to,
                ..
            } if c == chat => Some((sent, reply_to)),
            _ => None,
        })
    }

    fn record(&self, op: Op, call: Call) -> TransportResult<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(TransportError::Other(format!("{op:?} failed")));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId> {
        let sent = self.next_message_id();
        self.record(
            Op::SendText,
            Call::SendText {
                chat,
                text: text.to_string(),
                reply_to,
                controls,
                sent,
            },
        )?;
        Ok(sent)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<MessageId> {
        let sent = self.next_message_id();
        self.record(
            Op::SendPhoto,
            Call::SendPhoto {
                chat,
                file_id: card.file_id.clone(),
                controls,
                sent,
            },
        )?;
        Ok(sent)
    }

    async fn edit_message_controls(
        &self,
        chat: ChatId,
        message: MessageId,
        controls: Option<Controls>,
    ) -> TransportResult<()> {
        self.record(
            Op::EditControls,
            Call::EditControls {
                chat,
                message,
                controls,
            },
        )
    }

    async fn edit_message_media(
        &self,
        chat: ChatId,
        message: MessageId,
        card: &Card,
        controls: Option<Controls>,
    ) -> TransportResult<()> {
        self.record(
            Op::EditMedia,
            Call::EditMedia {
                chat,
                message,
                file_id: card.file_id.clone(),
                controls,
            },
        )
    }

    async fn forward_message(
        &self,
        from_chat: ChatId,
        to_chat: ChatId,
        message: MessageId,
    ) -> TransportResult<()> {
        self.record(
            Op::Forward,
            Call::Forward {
                from: from_chat,
                to: to_chat,
                message,
            },
        )
    }

    async fn acknowledge_interaction(&self, interaction_id: &str) -> TransportResult<()> {
        self.record(
            Op::Acknowledge,
            Call::Acknowledge {
                id: interaction_id.to_string(),
            },
        )
    }
}

/// Cards handed out in a fixed rotation
pub struct SequentialCards {
    cards: Vec<Card>,
    next: AtomicUsize,
}

impl SequentialCards {
    pub fn new(count: usize) -> Arc<Self> {
        let cards = (0..count)
            .map(|i| Card {
                name: format!("word-{i}.png"),
                file_id: format!("file-{i}"),
            })
            .collect();
        Arc::new(Self {
            cards,
            next: AtomicUsize::new(0),
        })
    }
}

impl CardSource for SequentialCards {
    fn draw(&self) -> Card {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.cards[i % self.cards.len()].clone()
    }
}

pub struct StubJokes {
    pub joke: Option<String>,
}

#[async_trait]
impl JokeSource for StubJokes {
    async fn fetch_joke(&self) -> Result<String> {
        self.joke
            .clone()
            .ok_or_else(|| anyhow::anyhow!("joke service unavailable"))
    }
}

pub fn engine_with(transport: &Arc<MockTransport>) -> Arc<ConversationEngine> {
    ConversationEngine::new(
        transport.clone(),
        SequentialCards::new(3),
        MAINTAINER_CHAT,
        TIMEOUT,
    )
}

pub fn context_with(transport: &Arc<MockTransport>, joke: Option<&str>) -> BotContext {
    BotContext::new(
        engine_with(transport),
        transport.clone(),
        Arc::new(StubJokes {
            joke: joke.map(str::to_string),
        }),
    )
}

pub fn user() -> UserInfo {
    UserInfo {
        id: 1001,
        full_name: "Maksim Bahdanovic".to_string(),
        language_code: Some("be".to_string()),
        username: Some("maksim".to_string()),
    }
}
