//! The turn dispatcher.
//!
//! [`RestaurantBot::on_turn`] is the single entry point for inbound
//! activities. It loads the conversation session and the user's state,
//! decides whether the message continues an in-flight dialog or needs to be
//! classified, runs the matching dialog (or answers from the FAQ), and saves
//! both records once at the end of the turn.

use crate::activity::{Activity, ActivityKind, ChannelAccount, OutboundMessage, TurnContext};
use crate::config::BotConfig;
use crate::dialog::{CancellationDialog, Dialog, ReservationDialog};
use crate::error::BotError;
use crate::faq::{FaqAnswerer, QnaMakerClient, StaticFaq};
use crate::intent::{Entities, Intent, IntentRecognizer, KeywordRecognizer, LuisRecognizer};
use crate::state::{ConversationSession, JsonFileStore, MemoryStore, StateStore, UserState};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WELCOME_TEMPLATE: &str = "Hi {{ name }}. I am rambo bot. How can I help you?";
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, I didn't get that. Please try again.";
pub const NO_ANSWER_MESSAGE: &str = "Sorry, I don't have an answer for that.";

/// The restaurant assistant.
///
/// Holds no per-conversation state of its own; everything that must survive
/// between turns goes through the two stores.
pub struct RestaurantBot {
    recognizer: Arc<dyn IntentRecognizer>,
    faq: Arc<dyn FaqAnswerer>,
    conversations: Arc<dyn StateStore<ConversationSession>>,
    users: Arc<dyn StateStore<UserState>>,
    reservation: ReservationDialog,
    cancellation: CancellationDialog,
}

impl RestaurantBot {
    /// Creates a bot with in-memory state.
    pub fn new(recognizer: Arc<dyn IntentRecognizer>, faq: Arc<dyn FaqAnswerer>) -> Self {
        Self {
            recognizer,
            faq,
            conversations: Arc::new(MemoryStore::new()),
            users: Arc::new(MemoryStore::new()),
            reservation: ReservationDialog::new(),
            cancellation: CancellationDialog::new(),
        }
    }

    pub fn with_conversation_store(
        mut self,
        store: Arc<dyn StateStore<ConversationSession>>,
    ) -> Self {
        self.conversations = store;
        self
    }

    pub fn with_user_store(mut self, store: Arc<dyn StateStore<UserState>>) -> Self {
        self.users = store;
        self
    }

    /// Assembles a bot from configuration, falling back to the offline
    /// recognizer, FAQ table and memory stores for anything not configured.
    pub fn from_config(config: &BotConfig) -> Self {
        let recognizer: Arc<dyn IntentRecognizer> = match &config.luis {
            Some(luis) => Arc::new(LuisRecognizer::new(luis.clone())),
            None => Arc::new(KeywordRecognizer::new()),
        };
        let faq: Arc<dyn FaqAnswerer> = match &config.qna {
            Some(qna) => Arc::new(QnaMakerClient::new(qna.clone())),
            None => Arc::new(StaticFaq::restaurant()),
        };
        info!(
            target = "rambo::bot",
            recognizer = recognizer.name(),
            faq = faq.name(),
            state_dir = ?config.state_dir,
            event = "bot_configured"
        );

        let bot = Self::new(recognizer, faq);
        match &config.state_dir {
            Some(dir) => bot
                .with_conversation_store(Arc::new(JsonFileStore::new(dir.join("conversations"))))
                .with_user_store(Arc::new(JsonFileStore::new(dir.join("users")))),
            None => bot,
        }
    }

    /// Handles one inbound activity and returns everything sent in reply.
    pub async fn on_turn(&self, activity: Activity) -> Result<Vec<OutboundMessage>, BotError> {
        let conversation_key = activity.conversation_id.clone();
        let user_key = activity.from.id.clone();
        info!(
            target = "rambo::bot",
            conversation = %conversation_key,
            user = %user_key,
            event = "turn_received"
        );

        let mut session = self.conversations.load(&conversation_key).await?;
        let mut user = self.users.load(&user_key).await?;

        let members = match &activity.kind {
            ActivityKind::MembersAdded { members_added } => Some(members_added.clone()),
            ActivityKind::Message { .. } => None,
        };
        let mut ctx = TurnContext::new(activity);

        match members {
            Some(members) => self.on_members_added(&mut ctx, &members)?,
            None => self.on_message(&mut ctx, &mut session, &mut user).await?,
        }

        self.conversations.save(&conversation_key, &session).await?;
        self.users.save(&user_key, &user).await?;

        let responses = ctx.into_responses();
        debug!(
            target = "rambo::bot",
            conversation = %conversation_key,
            responses = responses.len(),
            event = "turn_completed"
        );
        Ok(responses)
    }

    fn on_members_added(
        &self,
        ctx: &mut TurnContext,
        members: &[ChannelAccount],
    ) -> Result<(), BotError> {
        let bot_id = ctx.activity().recipient.id.clone();
        for member in members.iter().filter(|m| m.id != bot_id) {
            let welcome = crate::prompt!(WELCOME_TEMPLATE, name = &member.name)?;
            ctx.send_text(welcome);
            ctx.send_suggested_actions();
        }
        Ok(())
    }

    async fn on_message(
        &self,
        ctx: &mut TurnContext,
        session: &mut ConversationSession,
        user: &mut UserState,
    ) -> Result<(), BotError> {
        let text = ctx.activity().text().unwrap_or_default().to_string();

        let remembered = session.previous_intent.intent_name;
        let (intent, entities) = match remembered {
            Some(previous) if session.has_dialog_in_flight() => {
                debug!(
                    target = "rambo::bot",
                    intent = %previous,
                    event = "dialog_resumed"
                );
                (previous, Entities::default())
            }
            _ => {
                let recognition = match self.recognizer.recognize(&text).await {
                    Ok(recognition) => recognition,
                    Err(err) => {
                        warn!(
                            target = "rambo::bot",
                            recognizer = self.recognizer.name(),
                            external = err.is_external(),
                            error = %err,
                            event = "recognition_failed"
                        );
                        ctx.send_text(NOT_UNDERSTOOD_MESSAGE);
                        return Ok(());
                    }
                };
                info!(
                    target = "rambo::bot",
                    intent = %recognition.intent,
                    party_size = ?recognition.entities.party_size(),
                    event = "intent_recognized"
                );

                if recognition.intent.is_none() && remembered.is_none() {
                    self.answer_faq(ctx, &text).await;
                    return Ok(());
                }
                if !recognition.intent.is_none() {
                    session.previous_intent.intent_name = Some(recognition.intent);
                }
                (recognition.intent, recognition.entities)
            }
        };

        let dialog: &dyn Dialog = match intent {
            Intent::MakeReservation => &self.reservation,
            Intent::CancelReservation => &self.cancellation,
            Intent::None => {
                info!(
                    target = "rambo::bot",
                    intent = %intent,
                    event = "no_dialog_for_intent"
                );
                session.previous_intent.intent_name = None;
                return Ok(());
            }
        };
        self.run_dialog(dialog, ctx, session, user, &entities)
    }

    fn run_dialog(
        &self,
        dialog: &dyn Dialog,
        ctx: &mut TurnContext,
        session: &mut ConversationSession,
        user: &mut UserState,
        entities: &Entities,
    ) -> Result<(), BotError> {
        session.conversation_data.end_dialog = false;
        let result = dialog.run(ctx, &mut session.dialog_state, user, entities)?;
        session.conversation_data.end_dialog = result.is_complete();

        if result.is_complete() {
            debug!(
                target = "rambo::bot",
                dialog = dialog.id(),
                event = "dialog_cleared"
            );
            session.previous_intent.intent_name = None;
            session.dialog_state = None;
            ctx.send_suggested_actions();
        }
        Ok(())
    }

    async fn answer_faq(&self, ctx: &mut TurnContext, question: &str) {
        match self.faq.answers(question).await {
            Ok(answers) => match answers.into_iter().next() {
                Some(best) => {
                    debug!(
                        target = "rambo::bot",
                        score = best.score,
                        event = "faq_answered"
                    );
                    ctx.send_text(best.answer);
                }
                None => {
                    info!(target = "rambo::bot", event = "faq_no_answer");
                    ctx.send_text(NO_ANSWER_MESSAGE);
                }
            },
            Err(err) => {
                warn!(
                    target = "rambo::bot",
                    faq = self.faq.name(),
                    error = %err,
                    event = "faq_failed"
                );
                ctx.send_text(NO_ANSWER_MESSAGE);
            }
        }
        ctx.send_suggested_actions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::ActiveDialog;
    use crate::intent::Recognition;
    use async_trait::async_trait;

    struct Fixed(Intent);

    #[async_trait]
    impl IntentRecognizer for Fixed {
        async fn recognize(&self, _utterance: &str) -> Result<Recognition, BotError> {
            Ok(Recognition::new(self.0))
        }
    }

    struct Broken;

    #[async_trait]
    impl IntentRecognizer for Broken {
        async fn recognize(&self, _utterance: &str) -> Result<Recognition, BotError> {
            Err(BotError::Recognizer("service unavailable".to_string()))
        }
    }

    fn message(text: &str) -> Activity {
        Activity::message(
            "conv-1",
            ChannelAccount::new("user-1", "Alice"),
            ChannelAccount::new("bot", "rambo"),
            text,
        )
    }

    #[tokio::test]
    async fn test_recognizer_failure_sends_fallback() {
        let bot = RestaurantBot::new(Arc::new(Broken), Arc::new(StaticFaq::restaurant()));
        let responses = bot.on_turn(message("book a table")).await.unwrap();
        assert_eq!(responses, vec![OutboundMessage::text(NOT_UNDERSTOOD_MESSAGE)]);
    }

    #[tokio::test]
    async fn test_faq_without_answer_falls_back() {
        let bot = RestaurantBot::new(Arc::new(Fixed(Intent::None)), Arc::new(StaticFaq::new()));
        let responses = bot.on_turn(message("tell me a joke")).await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].content(), NO_ANSWER_MESSAGE);
        assert!(responses[1].is_menu());
    }

    #[tokio::test]
    async fn test_stale_completed_intent_is_reclassified() {
        let conversations = Arc::new(MemoryStore::<ConversationSession>::new());
        let mut stale = ConversationSession::default();
        stale.previous_intent.intent_name = Some(Intent::MakeReservation);
        stale.conversation_data.end_dialog = true;
        conversations.save("conv-1", &stale).await.unwrap();

        let bot = RestaurantBot::new(
            Arc::new(Fixed(Intent::CancelReservation)),
            Arc::new(StaticFaq::restaurant()),
        )
        .with_conversation_store(conversations.clone());

        let responses = bot.on_turn(message("cancel it")).await.unwrap();
        assert_eq!(
            responses[0].content(),
            "Would you like to cancel the reservation (1) yes or (2) no"
        );

        let session = conversations.load("conv-1").await.unwrap();
        assert_eq!(
            session.previous_intent.intent_name,
            Some(Intent::CancelReservation)
        );
        assert!(!session.conversation_data.end_dialog);
        assert!(matches!(
            session.dialog_state,
            Some(ActiveDialog::CancelReservation(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_completed_intent_reclassified_as_none_is_cleared() {
        let conversations = Arc::new(MemoryStore::<ConversationSession>::new());
        let mut stale = ConversationSession::default();
        stale.previous_intent.intent_name = Some(Intent::MakeReservation);
        stale.conversation_data.end_dialog = true;
        conversations.save("conv-1", &stale).await.unwrap();

        let bot = RestaurantBot::new(
            Arc::new(Fixed(Intent::None)),
            Arc::new(StaticFaq::restaurant()),
        )
        .with_conversation_store(conversations.clone());

        let responses = bot.on_turn(message("where are you")).await.unwrap();
        assert!(responses.is_empty());

        let session = conversations.load("conv-1").await.unwrap();
        assert!(session.previous_intent.intent_name.is_none());
        assert!(session.dialog_state.is_none());
        assert!(!session.has_dialog_in_flight());
    }

    #[test]
    fn test_from_config_offline() {
        let bot = RestaurantBot::from_config(&BotConfig::default());
        assert_eq!(bot.recognizer.name(), "KeywordRecognizer");
        assert_eq!(bot.faq.name(), "StaticFaq");
    }
}
