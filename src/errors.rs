//! # Error Types Module
//!
//! Errors raised by the messaging transport and by configuration loading.

use thiserror::Error;

/// Failure of a single outbound call to the messaging transport.
///
/// The conversation engine never propagates these: each one is logged where
/// it happens and the transition carries on with its remaining steps.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Telegram rejected or failed the request
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    /// Any other transport failure
    #[error("Transport error: {0}")]
    Other(String),
}

/// Invalid or missing process configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} env variable is not specified")]
    Missing(&'static str),
    #[error("{name} env variable must be one of {allowed}, got \"{value}\"")]
    InvalidOption {
        name: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("{name} env variable is not a valid {expected}: \"{value}\"")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::Missing("BOT_TOKEN").to_string(),
            "BOT_TOKEN env variable is not specified"
        );

        let invalid = ConfigError::InvalidOption {
            name: "MODE",
            value: "cloud".to_string(),
            allowed: "local|webhook",
        };
        assert_eq!(
            invalid.to_string(),
            "MODE env variable must be one of local|webhook, got \"cloud\""
        );
    }

    #[test]
    fn test_transport_error_messages() {
        let err = TransportError::Other("chat not found".to_string());
        assert_eq!(err.to_string(), "Transport error: chat not found");
    }
}
