//! Intent vocabulary and the recognizer seam.
//!
//! The bot only understands a handful of intents. Recognizers map a raw
//! utterance onto one of them plus any entities they managed to extract.

pub mod keyword;
pub mod luis;

use crate::error::BotError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use keyword::KeywordRecognizer;
pub use luis::{LuisConfig, LuisRecognizer};

/// The fixed intent vocabulary. Names match the classifier's labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Intent {
    #[strum(serialize = "Make_Reservation")]
    #[serde(rename = "Make_Reservation")]
    MakeReservation,

    #[strum(serialize = "Cancel_Reservation")]
    #[serde(rename = "Cancel_Reservation")]
    CancelReservation,

    #[strum(serialize = "None")]
    #[serde(rename = "None")]
    None,
}

impl Intent {
    /// Parses a classifier label, mapping anything unknown to [`Intent::None`].
    pub fn from_label(label: &str) -> Self {
        match Intent::from_str(label) {
            Ok(intent) => intent,
            Err(_) => {
                tracing::debug!(
                    target = "rambo::intent",
                    label,
                    event = "unknown_intent_label"
                );
                Intent::None
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Intent::None)
    }
}

/// An error type for intent parsing failures.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Parsing failed: Could not parse '{value}' into a valid intent")]
    ParseFailed { value: String },

    #[error("Recognizer response did not contain a top intent")]
    MissingTopIntent,
}

impl From<IntentError> for BotError {
    fn from(err: IntentError) -> Self {
        BotError::Recognizer(err.to_string())
    }
}

/// Parses a classifier label strictly.
pub fn parse_intent(label: &str) -> Result<Intent, IntentError> {
    Intent::from_str(label).map_err(|_| IntentError::ParseFailed {
        value: label.to_string(),
    })
}

/// Structured values extracted alongside the intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// Party sizes mentioned in the utterance ("a table for 4").
    #[serde(rename = "noOfParticipants", default)]
    pub no_of_participants: Vec<i64>,
}

impl Entities {
    pub fn with_party_size(mut self, size: i64) -> Self {
        self.no_of_participants.push(size);
        self
    }

    /// The first extracted party size, if any.
    pub fn party_size(&self) -> Option<i64> {
        self.no_of_participants.first().copied()
    }
}

/// The classifier's verdict for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub intent: Intent,
    #[serde(default)]
    pub entities: Entities,
}

impl Recognition {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            entities: Entities::default(),
        }
    }

    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.entities = entities;
        self
    }

    /// A recognition carrying no intent and no entities.
    pub fn none() -> Self {
        Self::new(Intent::None)
    }
}

/// Maps raw text to an [`Intent`] and its entities.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Classifies a single utterance.
    async fn recognize(&self, utterance: &str) -> Result<Recognition, BotError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "IntentRecognizer"
    }
}
