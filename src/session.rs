//! # Conversation Store
//!
//! Process-wide map from chat id to that chat's [`ChatSession`]. Each session
//! sits behind its own async mutex: the engine holds the lock for the whole
//! of a transition, so events for one chat are applied one at a time while
//! different chats proceed independently. Tokio mutexes grant the lock in
//! request order, which keeps per-chat events in arrival order.
//!
//! Sessions are created on first touch and never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use teloxide::types::ChatId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::AbortHandle;

use crate::dialogue::{ActiveFlow, ConversationState};

/// Per-chat conversation record
#[derive(Debug, Default)]
pub struct ChatSession {
    pub state: ConversationState,
    /// Bumped on every transition; a scheduled timeout only fires for the
    /// generation it was armed with
    pub generation: u64,
    /// Pending inactivity timeout of the current flow
    pub timeout: Option<AbortHandle>,
}

impl ChatSession {
    pub fn active_flow(&self) -> ActiveFlow {
        self.state.active_flow()
    }

    /// Start a new generation, cancelling any timeout armed for the old one
    pub fn advance_generation(&mut self) -> u64 {
        self.cancel_timeout();
        self.generation += 1;
        self.generation
    }

    pub fn cancel_timeout(&mut self) {
        if let Some(handle) = self.timeout.take() {
            handle.abort();
        }
    }
}

/// Read-only copy of a session, for logging and tests
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: ConversationState,
    pub generation: u64,
    pub timeout_armed: bool,
}

/// Thread-safe store of chat sessions
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Arc<AsyncMutex<ChatSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, chat: ChatId) -> Arc<AsyncMutex<ChatSession>> {
        // A poisoned map only means another thread panicked mid-insert; the
        // map itself is still consistent
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(sessions.entry(chat).or_default())
    }

    /// Acquire exclusive access to a chat's session, creating it on first use
    pub async fn lock(&self, chat: ChatId) -> OwnedMutexGuard<ChatSession> {
        self.entry(chat).lock_owned().await
    }

    /// Copy of the session state, or `None` for chats never seen
    pub async fn snapshot(&self, chat: ChatId) -> Option<SessionSnapshot> {
        let session = {
            let sessions = self
                .sessions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sessions.get(&chat).map(Arc::clone)
        }?;

        let session = session.lock().await;
        Some(SessionSnapshot {
            state: session.state.clone(),
            generation: session.generation,
            timeout_armed: session.timeout.is_some(),
        })
    }

    /// Number of chats that have ever interacted with the bot
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use teloxide::types::MessageId;

    #[tokio::test]
    async fn test_session_created_on_first_lock() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot(ChatId(1)).await.is_none());

        {
            let session = store.lock(ChatId(1)).await;
            assert_eq!(session.active_flow(), ActiveFlow::None);
        }

        assert_eq!(store.len(), 1);
        let snapshot = store.snapshot(ChatId(1)).await.unwrap();
        assert_eq!(snapshot.state, ConversationState::Idle);
        assert_eq!(snapshot.generation, 0);
    }

    #[tokio::test]
    async fn test_mutations_persist_between_locks() {
        let store = SessionStore::new();
        {
            let mut session = store.lock(ChatId(5)).await;
            session.state = ConversationState::CardShown {
                last_card_control: MessageId(42),
            };
            session.advance_generation();
        }

        let snapshot = store.snapshot(ChatId(5)).await.unwrap();
        assert_eq!(snapshot.state.last_card_control(), Some(MessageId(42)));
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn test_chats_are_independent() {
        let store = Arc::new(SessionStore::new());
        let _held = store.lock(ChatId(1)).await;

        // Another chat is not blocked by the held lock
        let other = tokio::time::timeout(Duration::from_secs(1), store.lock(ChatId(2))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_same_chat_is_serialized() {
        let store = Arc::new(SessionStore::new());
        let held = store.lock(ChatId(1)).await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), store.lock(ChatId(1))).await;
        assert!(blocked.is_err());

        drop(held);
        let acquired = tokio::time::timeout(Duration::from_secs(1), store.lock(ChatId(1))).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_advance_generation_aborts_pending_timeout() {
        let store = SessionStore::new();
        let mut session = store.lock(ChatId(9)).await;

        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        session.timeout = Some(task.abort_handle());

        assert_eq!(session.advance_generation(), 1);
        assert!(session.timeout.is_none());
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
