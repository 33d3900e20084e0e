//! Persisted conversation and user state.
//!
//! The dispatcher reads both records at the start of a turn and writes them
//! back once at the end, so the next turn always observes this turn's writes.

pub mod json_file;
pub mod memory;

use crate::dialog::ActiveDialog;
use crate::error::BotError;
use crate::intent::Intent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// The intent whose dialog is (or was last) running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousIntent {
    #[serde(rename = "intentName", default)]
    pub intent_name: Option<Intent>,
}

/// Per-conversation flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationData {
    /// Whether the last dialog run reached a terminal step.
    #[serde(rename = "endDialog", default)]
    pub end_dialog: bool,
}

/// Everything the bot remembers about one conversation between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    #[serde(rename = "previousIntent", default)]
    pub previous_intent: PreviousIntent,

    // Key spelling is part of the persisted format.
    #[serde(rename = "conservationData", default)]
    pub conversation_data: ConversationData,

    #[serde(rename = "dialogState", default)]
    pub dialog_state: Option<ActiveDialog>,
}

impl ConversationSession {
    /// True while a dialog has started and not yet reached a terminal step.
    pub fn has_dialog_in_flight(&self) -> bool {
        self.previous_intent.intent_name.is_some() && !self.conversation_data.end_dialog
    }
}

/// A confirmed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub name: String,
    pub party_size: i64,
    pub date: String,
    pub time: String,
}

/// Everything the bot remembers about one user across conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

impl UserState {
    /// Finds the first booking made under `name` (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&Reservation> {
        let wanted = name.trim().to_lowercase();
        self.reservations
            .iter()
            .find(|r| r.name.trim().to_lowercase() == wanted)
    }

    /// Removes one booking equal to `reservation`. Returns whether one was removed.
    pub fn remove(&mut self, reservation: &Reservation) -> bool {
        match self.reservations.iter().position(|r| r == reservation) {
            Some(idx) => {
                self.reservations.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Keyed load/save of a persisted record.
///
/// `load` returns `T::default()` for keys that were never saved.
#[async_trait]
pub trait StateStore<T>: Send + Sync
where
    T: Send + Sync,
{
    async fn load(&self, key: &str) -> Result<T, BotError>;

    async fn save(&self, key: &str, value: &T) -> Result<(), BotError>;
}
