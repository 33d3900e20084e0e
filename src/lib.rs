//! `rambo` - a restaurant-assistant bot.
//!
//! The bot classifies each utterance into an intent, then drives multi-turn
//! waterfall dialogs that collect a reservation (name, party size, date,
//! time) or cancel one. Anything it cannot act on is answered from an FAQ
//! knowledge base.
//!
//! Every external capability sits behind a small trait with an online and an
//! offline implementation:
//!
//! - intent classification: [`IntentRecognizer`] ([`LuisRecognizer`], [`KeywordRecognizer`])
//! - FAQ answering: [`FaqAnswerer`] ([`QnaMakerClient`], [`StaticFaq`])
//! - state persistence: [`StateStore`] ([`MemoryStore`], [`JsonFileStore`])
//!
//! [`RestaurantBot::on_turn`] ties them together, one activity at a time.

pub mod activity;
pub mod bot;
pub mod config;
pub mod dialog;
pub mod error;
pub mod faq;
pub mod intent;
pub mod observability;
pub mod prompt;
pub mod state;

pub use activity::{Activity, ActivityKind, ChannelAccount, OutboundMessage, TurnContext};
pub use bot::RestaurantBot;
pub use config::BotConfig;
pub use dialog::{ActiveDialog, Dialog, DialogTurnResult};
pub use error::BotError;
pub use faq::{FaqAnswer, FaqAnswerer, QnaMakerClient, StaticFaq};
pub use intent::{
    Entities, Intent, IntentError, IntentRecognizer, KeywordRecognizer, LuisRecognizer,
    Recognition,
};
pub use state::{ConversationSession, JsonFileStore, MemoryStore, StateStore, UserState};
