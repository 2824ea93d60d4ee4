//! Shared dependencies of the update handlers.

use chrono::Utc;
use std::sync::Arc;
use teloxide::types::ChatId;
use tracing::{error, warn};

use crate::joke::JokeSource;
use crate::localization::t_args;
use crate::transport::Transport;

use super::dialogue_manager::ConversationEngine;
use super::ui_builder::{format_user_info, UserInfo};

/// Longest update dump included in an error report, in characters. Telegram
/// rejects texts over 4096 characters.
pub const MAX_UPDATE_DUMP_CHARS: usize = 2500;

/// Everything a handler needs, injected into the dispatcher once
pub struct BotContext {
    pub engine: Arc<ConversationEngine>,
    pub transport: Arc<dyn Transport>,
    pub jokes: Arc<dyn JokeSource>,
}

impl BotContext {
    pub fn new(
        engine: Arc<ConversationEngine>,
        transport: Arc<dyn Transport>,
        jokes: Arc<dyn JokeSource>,
    ) -> Self {
        Self {
            engine,
            transport,
            jokes,
        }
    }

    pub fn maintainer_chat(&self) -> ChatId {
        self.engine.maintainer_chat()
    }

    /// Log a handler failure and report it to the maintainer chat together
    /// with a dump of the update that caused it
    pub async fn report_error(&self, user: Option<&UserInfo>, err: &anyhow::Error, update: &str) {
        error!(error = %err, update, "Update handler failed");

        let user_info = user
            .map(format_user_info)
            .unwrap_or_else(|| "unknown".to_string());
        let report = t_args(
            "maintainer-error",
            &[
                ("time", &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                ("user_info", &user_info),
                ("error", &format!("{err:#}")),
                ("update", &truncate_dump(update)),
            ],
        );

        if let Err(e) = self
            .transport
            .send_text(self.maintainer_chat(), &report, None, None)
            .await
        {
            warn!(error = %e, "Failed to report error to maintainer");
        }
    }
}

fn truncate_dump(dump: &str) -> String {
    match dump.char_indices().nth(MAX_UPDATE_DUMP_CHARS) {
        Some((cut, _)) => format!("{}\n...", &dump[..cut]),
        None => dump.to_string(),
    }
}
