//! LuisRecognizer - intent classification through the LUIS v3 prediction API.
//!
//! Credentials can be provided directly or loaded from the environment.
//!
//! # Example
//!
//! ```rust,no_run
//! use rambo::intent::{IntentRecognizer, LuisRecognizer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // From environment variables (appId, subscriptionKey, region)
//! let recognizer = LuisRecognizer::try_from_env()?;
//! let recognition = recognizer.recognize("book a table for 4").await?;
//! # Ok(())
//! # }
//! ```

use super::{Entities, Intent, IntentError, IntentRecognizer, Recognition};
use crate::error::BotError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use url::Url;

/// Entity name the LUIS app uses for party sizes.
const PARTY_SIZE_ENTITY: &str = "noOfParticipants";

/// Connection settings for a LUIS application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuisConfig {
    pub application_id: String,
    pub endpoint_key: String,
    pub azure_region: String,
}

impl LuisConfig {
    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `appId` (required)
    /// - `subscriptionKey` (required)
    /// - `region` (required, e.g. `westus`)
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
            application_id: required("appId")?,
            endpoint_key: required("subscriptionKey")?,
            azure_region: required("region")?,
        })
    }

    fn prediction_url(&self, query: &str) -> Result<Url, BotError> {
        let base = format!(
            "https://{}.api.cognitive.microsoft.com/luis/prediction/v3.0/apps/{}/slots/production/predict",
            self.azure_region, self.application_id
        );
        let mut url = Url::parse(&base)
            .map_err(|e| BotError::Config(format!("Invalid LUIS endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("subscription-key", &self.endpoint_key)
            .append_pair("query", query)
            .append_pair("show-all-intents", "true")
            .append_pair("log", "true");
        Ok(url)
    }
}

/// Recognizer that talks to the LUIS HTTP API.
#[derive(Clone)]
pub struct LuisRecognizer {
    client: Client,
    config: LuisConfig,
}

impl LuisRecognizer {
    pub fn new(config: LuisConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn try_from_env() -> Result<Self, BotError> {
        Ok(Self::new(LuisConfig::try_from_env()?))
    }

    async fn predict(&self, utterance: &str) -> Result<PredictionResponse, BotError> {
        let url = self.config.prediction_url(utterance)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| BotError::Recognizer(format!("LUIS request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read LUIS error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| BotError::Recognizer(format!("Failed to parse LUIS response: {err}")))
    }
}

#[async_trait]
impl IntentRecognizer for LuisRecognizer {
    async fn recognize(&self, utterance: &str) -> Result<Recognition, BotError> {
        let response = self.predict(utterance).await?;
        let recognition = into_recognition(response)?;
        tracing::debug!(
            target = "rambo::intent",
            recognizer = self.name(),
            intent = %recognition.intent,
            party_size = ?recognition.entities.party_size(),
            event = "utterance_classified"
        );
        Ok(recognition)
    }

    fn name(&self) -> &str {
        "LuisRecognizer"
    }
}

#[derive(Deserialize)]
struct PredictionResponse {
    prediction: Prediction,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    top_intent: Option<String>,
    #[serde(default)]
    intents: HashMap<String, IntentScore>,
    #[serde(default)]
    entities: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct IntentScore {
    score: f64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn into_recognition(response: PredictionResponse) -> Result<Recognition, BotError> {
    let prediction = response.prediction;

    // Older apps omit topIntent; fall back to the highest scoring intent.
    let label = match prediction.top_intent {
        Some(label) => label,
        None => prediction
            .intents
            .iter()
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(name, _)| name.clone())
            .ok_or(IntentError::MissingTopIntent)?,
    };

    let mut entities = Entities::default();
    if let Some(serde_json::Value::Array(values)) = prediction.entities.get(PARTY_SIZE_ENTITY) {
        entities.no_of_participants = values
            .iter()
            .filter_map(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
            .collect();
    }

    Ok(Recognition::new(Intent::from_label(&label)).with_entities(entities))
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
