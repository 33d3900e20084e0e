//! Bot configuration loaded from the environment.

use crate::faq::QnaConfig;
use crate::intent::LuisConfig;
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Directory for the JSON file store. Unset keeps state in memory.
pub const STATE_DIR_VAR: &str = "RAMBO_STATE_DIR";
/// Log level name for the `rambo` target.
pub const LOG_LEVEL_VAR: &str = "RAMBO_LOG";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Everything needed to assemble a [`RestaurantBot`](crate::bot::RestaurantBot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// LUIS settings; `None` selects the offline keyword recognizer.
    pub luis: Option<LuisConfig>,
    /// QnA Maker settings; `None` selects the built-in FAQ table.
    pub qna: Option<QnaConfig>,
    pub state_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            luis: None,
            qna: None,
            state_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration through an arbitrary variable lookup.
    ///
    /// A service with none of its variables set is silently left offline; a
    /// partially configured one is logged and left offline too.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let luis = if ["appId", "subscriptionKey", "region"]
            .iter()
            .any(|name| non_blank(name).is_some())
        {
            LuisConfig::from_lookup(&lookup)
                .map_err(|err| {
                    warn!(
                        target = "rambo::config",
                        error = %err,
                        event = "luis_config_incomplete"
                    )
                })
                .ok()
        } else {
            None
        };

        let qna = if ["QnAKnowledgebaseId", "QnAEndpointKey", "QnAMakerEndpointHostKey"]
            .iter()
            .any(|name| non_blank(name).is_some())
        {
            QnaConfig::from_lookup(&lookup)
                .map_err(|err| {
                    warn!(
                        target = "rambo::config",
                        error = %err,
                        event = "qna_config_incomplete"
                    )
                })
                .ok()
        } else {
            None
        };

        Self {
            luis,
            qna,
            state_dir: non_blank(STATE_DIR_VAR).map(PathBuf::from),
            log_level: non_blank(LOG_LEVEL_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}
