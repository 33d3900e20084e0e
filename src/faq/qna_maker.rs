//! QnaMakerClient - FAQ answers from a QnA Maker knowledge base.

use super::{FaqAnswer, FaqAnswerer};
use crate::error::BotError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;

/// Connection settings for a QnA Maker knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QnaConfig {
    pub knowledge_base_id: String,
    pub endpoint_key: String,
    /// Runtime host, e.g. `https://my-kb.azurewebsites.net/qnamaker`.
    pub host: String,
}

impl QnaConfig {
    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `QnAKnowledgebaseId` (required)
    /// - `QnAEndpointKey` (required)
    /// - `QnAMakerEndpointHostKey` (required)
    pub fn try_from_env() -> Result<Self, BotError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| BotError::Config(format!("{name} environment variable not set")))
        };
        Ok(Self {
            knowledge_base_id: required("QnAKnowledgebaseId")?,
            endpoint_key: required("QnAEndpointKey")?,
            host: required("QnAMakerEndpointHostKey")?,
        })
    }

    fn generate_answer_url(&self) -> String {
        format!(
            "{}/knowledgebases/{}/generateAnswer",
            self.host.trim_end_matches('/'),
            self.knowledge_base_id
        )
    }
}

/// FAQ answerer backed by the QnA Maker runtime API.
#[derive(Clone)]
pub struct QnaMakerClient {
    client: Client,
    config: QnaConfig,
    top: u32,
}

impl QnaMakerClient {
    pub fn new(config: QnaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            top: 1,
        }
    }

    pub fn try_from_env() -> Result<Self, BotError> {
        Ok(Self::new(QnaConfig::try_from_env()?))
    }

    /// Sets how many candidate answers to request.
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top.max(1);
        self
    }
}

#[async_trait]
impl FaqAnswerer for QnaMakerClient {
    async fn answers(&self, question: &str) -> Result<Vec<FaqAnswer>, BotError> {
        let request = GenerateAnswerRequest {
            question: question.to_string(),
            top: self.top,
        };

        let response = self
            .client
            .post(self.config.generate_answer_url())
            .header(
                "Authorization",
                format!("EndpointKey {}", self.config.endpoint_key),
            )
            .json(&request)
            .send()
            .await
            .map_err(|err| BotError::Faq(format!("QnA Maker request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read QnA Maker error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateAnswerResponse = response
            .json()
            .await
            .map_err(|err| BotError::Faq(format!("Failed to parse QnA Maker response: {err}")))?;

        Ok(extract_answers(parsed))
    }

    fn name(&self) -> &str {
        "QnaMakerClient"
    }
}

#[derive(Serialize)]
struct GenerateAnswerRequest {
    question: String,
    top: u32,
}

#[derive(Deserialize)]
struct GenerateAnswerResponse {
    #[serde(default)]
    answers: Vec<QnaAnswer>,
}

#[derive(Deserialize)]
struct QnaAnswer {
    answer: String,
    /// QnA Maker scores on a 0-100 scale.
    #[serde(default)]
    score: f64,
    #[serde(default)]
    id: i64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// The service answers "No good match found in KB." with id -1 instead of an
// empty list.
fn extract_answers(response: GenerateAnswerResponse) -> Vec<FaqAnswer> {
    response
        .answers
        .into_iter()
        .filter(|a| a.id >= 0)
        .map(|a| FaqAnswer::new(a.answer, a.score / 100.0))
        .collect()
}

fn map_http_error(status: StatusCode, body: String) -> BotError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    BotError::Http {
        status: status.as_u16(),
        message,
    }
}
