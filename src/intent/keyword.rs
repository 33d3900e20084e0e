//! Keyword recognizer - fast, deterministic, offline intent classification
//!
//! Used when no LUIS application is configured, and as the recognizer in
//! tests. Matches keyword sets against the lowercased utterance and pulls a
//! party size out of phrases like "table for 4" or "party of five".

use super::{Entities, Intent, IntentRecognizer, Recognition};
use crate::error::BotError;
use crate::prompt::leading_number_words;
use async_trait::async_trait;
use regex::Regex;

/// Rule-based recognizer using keyword heuristics.
///
/// # Examples
///
/// ```rust,ignore
/// use rambo::intent::{Intent, IntentRecognizer, KeywordRecognizer};
///
/// let recognizer = KeywordRecognizer::new();
/// let recognition = recognizer.recognize("book a table for 4").await?;
/// assert_eq!(recognition.intent, Intent::MakeReservation);
/// assert_eq!(recognition.entities.party_size(), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct KeywordRecognizer {
    rules: Vec<(Intent, Vec<&'static str>)>,
    party_size: Regex,
}

impl Default for KeywordRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordRecognizer {
    pub fn new() -> Self {
        // Cancellation is checked first: "cancel my reservation" also mentions a reservation.
        let rules = vec![
            (
                Intent::CancelReservation,
                vec!["cancel", "call off", "drop my booking", "remove my booking"],
            ),
            (
                Intent::MakeReservation,
                vec!["reserv", "book", "table for", "make a reservation"],
            ),
        ];

        Self {
            rules,
            party_size: Regex::new(
                r"(?i)\b(?:for|of|party of|table for)\s+(\d{1,3}|[a-z]+(?:[\s-]+[a-z]+)?)(?:\s+(?:people|persons|guests|of us))?\b",
            )
            .expect("static party-size pattern"),
        }
    }

    fn classify(&self, text: &str) -> Intent {
        for (intent, keywords) in &self.rules {
            if keywords.iter().any(|kw| text.contains(kw)) {
                return *intent;
            }
        }
        Intent::None
    }

    fn extract_entities(&self, text: &str) -> Entities {
        let mut entities = Entities::default();
        for caps in self.party_size.captures_iter(text) {
            let raw = &caps[1];
            let value = raw.parse::<i64>().ok().or_else(|| leading_number_words(raw));
            if let Some(size) = value {
                entities.no_of_participants.push(size);
            }
        }
        entities
    }
}

#[async_trait]
impl IntentRecognizer for KeywordRecognizer {
    async fn recognize(&self, utterance: &str) -> Result<Recognition, BotError> {
        let text = utterance.to_lowercase();
        let intent = self.classify(&text);
        let entities = match intent {
            Intent::MakeReservation => self.extract_entities(&text),
            _ => Entities::default(),
        };

        tracing::debug!(
            target = "rambo::intent",
            recognizer = self.name(),
            intent = %intent,
            party_size = ?entities.party_size(),
            event = "utterance_classified"
        );

        Ok(Recognition::new(intent).with_entities(entities))
    }

    fn name(&self) -> &str {
        "KeywordRecognizer"
    }
}
