//! # Configuration Module
//!
//! Process configuration read from environment variables (a `.env` file is
//! honoured through `dotenv` in `main`).

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::localization::{DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};

// Constants for bot configuration
pub const DEFAULT_CARDS_PATH: &str = "photo_file_ids.json";
pub const DEFAULT_CONVERSATION_TIMEOUT_SECS: u64 = 20 * 60; // 20 minutes
pub const DEFAULT_JOKE_URL: &str = "https://icanhazdadjoke.com/";

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Long polling, used for local runs
    Polling,
    /// Telegram pushes updates to `url`, served on `0.0.0.0:port`
    Webhook { port: u16, url: String },
}

/// Conversation timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationConfig {
    /// Inactivity window after which an unfinished flow is closed
    pub timeout: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_CONVERSATION_TIMEOUT_SECS),
        }
    }
}

/// Bot token and maintainer chat, the part of the configuration shared with
/// the card upload tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub contact_chat_id: i64,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let token = required(vars, "BOT_TOKEN")?.to_string();

        let contact = required(vars, "CONTACT_CHAT_ID")?;
        let contact_chat_id = contact
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "CONTACT_CHAT_ID",
                value: contact.to_string(),
                expected: "chat id",
            })?;

        Ok(Self {
            token,
            contact_chat_id,
        })
    }
}

fn optional<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'a>(vars: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, ConfigError> {
    optional(vars, name).ok_or(ConfigError::Missing(name))
}

/// Configuration structure for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// Chat receiving feedback, new user notices and error reports
    pub contact_chat_id: i64,
    pub mode: RunMode,
    /// JSON file with the uploaded card file ids
    pub cards_path: String,
    /// Language of the bot replies
    pub language: String,
    pub joke_url: String,
    pub conversation: ConversationConfig,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build configuration from a variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| optional(vars, name);
        let require = |name: &'static str| required(vars, name);

        let Credentials {
            token,
            contact_chat_id,
        } = Credentials::from_vars(vars)?;

        let mode = match require("MODE")? {
            "local" => RunMode::Polling,
            // "heroku" is kept for existing deployments
            "webhook" | "heroku" => {
                let port_str = require("PORT")?;
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "PORT",
                        value: port_str.to_string(),
                        expected: "port number",
                    })?;

                let url = match (get("WEBHOOK_URL"), get("APP_NAME")) {
                    (Some(url), _) => url.trim_end_matches('/').to_string(),
                    (None, Some(app_name)) => format!("https://{app_name}.herokuapp.com"),
                    (None, None) => return Err(ConfigError::Missing("APP_NAME")),
                };

                RunMode::Webhook {
                    port,
                    url: format!("{url}/{token}"),
                }
            }
            other => {
                return Err(ConfigError::InvalidOption {
                    name: "MODE",
                    value: other.to_string(),
                    allowed: "local|webhook|heroku",
                })
            }
        };

        let language = get("BOT_LANGUAGE").unwrap_or(DEFAULT_LANGUAGE);
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(ConfigError::InvalidOption {
                name: "BOT_LANGUAGE",
                value: language.to_string(),
                allowed: "be|en",
            });
        }

        let conversation = match get("CONVERSATION_TIMEOUT_SECS") {
            Some(secs_str) => {
                let secs = secs_str
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        name: "CONVERSATION_TIMEOUT_SECS",
                        value: secs_str.to_string(),
                        expected: "positive number of seconds",
                    })?;
                ConversationConfig {
                    timeout: Duration::from_secs(secs),
                }
            }
            None => ConversationConfig::default(),
        };

        Ok(Self {
            token,
            contact_chat_id,
            mode,
            cards_path: get("CARDS_PATH").unwrap_or(DEFAULT_CARDS_PATH).to_string(),
            language: language.to_string(),
            joke_url: get("JOKE_URL").unwrap_or(DEFAULT_JOKE_URL).to_string(),
            conversation,
        })
    }
}
