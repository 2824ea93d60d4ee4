//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, User};

// Import localization
use crate::localization::t;

use crate::dialogue::CallbackAction;
use crate::transport::Controls;

/// Submitter details included in maintainer notifications
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub id: u64,
    pub full_name: String,
    pub language_code: Option<String>,
    pub username: Option<String>,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.0,
            full_name: user.full_name(),
            language_code: user.language_code.clone(),
            username: user.username.clone(),
        }
    }
}

/// Format user details for the maintainer chat
pub fn format_user_info(user: &UserInfo) -> String {
    let mut info = format!(
        "id: {}\nfull name: {}\nlanguage code: {}",
        user.id,
        user.full_name,
        user.language_code.as_deref().unwrap_or("-")
    );
    if let Some(username) = &user.username {
        info.push_str(&format!("\nlink: @{}", username));
    }
    info
}

/// Create the inline keyboard for a set of controls
pub fn create_keyboard(controls: Controls) -> InlineKeyboardMarkup {
    match controls {
        Controls::FeedbackConfirmation => create_feedback_confirmation_keyboard(),
        Controls::CardBrowsing => create_card_keyboard(),
    }
}

/// Yes / No buttons on one row
pub fn create_feedback_confirmation_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t("feedback-button-yes"),
            CallbackAction::ConfirmFeedback.as_data(),
        ),
        InlineKeyboardButton::callback(
            t("feedback-button-no"),
            CallbackAction::RejectFeedback.as_data(),
        ),
    ]])
}

/// Resend-current and send-next buttons, one per row
pub fn create_card_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t("card-button-resend"),
            CallbackAction::ResendCurrent.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            t("card-button-next"),
            CallbackAction::SendNext.as_data(),
        )],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                        other => panic!("unexpected button kind {other:?}"),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_feedback_keyboard_layout() {
        let markup = create_keyboard(Controls::FeedbackConfirmation);
        assert_eq!(callback_data(&markup), vec![vec!["2".to_string(), "3".to_string()]]);
    }

    #[test]
    fn test_card_keyboard_layout() {
        let markup = create_keyboard(Controls::CardBrowsing);
        assert_eq!(
            callback_data(&markup),
            vec![vec!["0".to_string()], vec!["1".to_string()]]
        );
    }

    #[test]
    fn test_format_user_info_with_username() {
        let user = UserInfo {
            id: 12345,
            full_name: "Janka Kupala".to_string(),
            language_code: Some("be".to_string()),
            username: Some("janka".to_string()),
        };

        assert_eq!(
            format_user_info(&user),
            "id: 12345\nfull name: Janka Kupala\nlanguage code: be\nlink: @janka"
        );
    }

    #[test]
    fn test_format_user_info_without_optional_fields() {
        let user = UserInfo {
            id: 1,
            full_name: "Anon".to_string(),
            language_code: None,
            username: None,
        };

        let info = format_user_info(&user);
        assert!(info.ends_with("language code: -"));
        assert!(!info.contains("link"));
    }
}
