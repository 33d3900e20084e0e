//! Error types shared across the bot.

use thiserror::Error;

/// Errors that can occur while handling a turn.
#[derive(Debug, Error)]
pub enum BotError {
    /// The intent recognizer could not classify the utterance.
    #[error("Intent recognition failed: {0}")]
    Recognizer(String),

    /// The FAQ answerer could not produce answers.
    #[error("FAQ lookup failed: {0}")]
    Faq(String),

    /// An external service answered with a non-success status.
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Loading or saving persisted state failed.
    #[error("State store error: {0}")]
    Store(String),

    /// A required configuration value is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error occurred while touching the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A message template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl BotError {
    /// Whether this failure came from an external collaborator (LUIS, QnA Maker)
    /// rather than from the bot's own storage or configuration.
    ///
    /// The dispatcher degrades these to a fallback reply instead of failing the turn.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            BotError::Recognizer(_) | BotError::Faq(_) | BotError::Http { .. }
        )
    }
}
