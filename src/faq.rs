//! FAQ answering for utterances that carry no actionable intent.

pub mod qna_maker;

use crate::error::BotError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use qna_maker::{QnaConfig, QnaMakerClient};

/// A canned answer with its match score (0.0 - 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqAnswer {
    pub answer: String,
    pub score: f64,
}

impl FaqAnswer {
    pub fn new(answer: impl Into<String>, score: f64) -> Self {
        Self {
            answer: answer.into(),
            score,
        }
    }
}

/// Maps a question onto an ordered list of candidate answers, best first.
#[async_trait]
pub trait FaqAnswerer: Send + Sync {
    async fn answers(&self, question: &str) -> Result<Vec<FaqAnswer>, BotError>;

    fn name(&self) -> &str {
        "FaqAnswerer"
    }
}

/// An offline knowledge base: keyword sets mapped to answers.
///
/// A question scores by the fraction of an entry's keywords it contains;
/// entries with no matching keyword are not returned.
#[derive(Debug, Clone, Default)]
pub struct StaticFaq {
    entries: Vec<(Vec<String>, String)>,
}

impl StaticFaq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, keywords: &[&str], answer: impl Into<String>) -> Self {
        self.entries.push((
            keywords.iter().map(|k| k.to_lowercase()).collect(),
            answer.into(),
        ));
        self
    }

    /// The knowledge base the console bot ships with.
    pub fn restaurant() -> Self {
        Self::new()
            .with_entry(
                &["address", "where", "located", "location", "directions"],
                "We are located at 12 Harbour Street, Springfield.",
            )
            .with_entry(
                &["hours", "open", "opening", "close", "closing"],
                "We are open every day from 11am to 11pm.",
            )
            .with_entry(
                &["menu", "vegetarian", "vegan", "dishes", "food"],
                "Our menu changes weekly and always includes vegetarian and vegan dishes.",
            )
            .with_entry(
                &["parking", "park", "car"],
                "Free parking is available behind the restaurant.",
            )
            .with_entry(
                &["phone", "call", "contact", "number"],
                "You can reach us on 555-0142.",
            )
    }
}

#[async_trait]
impl FaqAnswerer for StaticFaq {
    async fn answers(&self, question: &str) -> Result<Vec<FaqAnswer>, BotError> {
        let text = question.to_lowercase();
        let mut answers: Vec<FaqAnswer> = self
            .entries
            .iter()
            .filter_map(|(keywords, answer)| {
                let hits = keywords.iter().filter(|kw| text.contains(kw.as_str())).count();
                (hits > 0).then(|| FaqAnswer::new(answer.clone(), hits as f64 / keywords.len() as f64))
            })
            .collect();

        answers.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(answers)
    }

    fn name(&self) -> &str {
        "StaticFaq"
    }
}
