use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rambo::activity::{Activity, ChannelAccount, MENU_TEXT, OutboundMessage};
use rambo::dialog::ActiveDialog;
use rambo::faq::{FaqAnswer, FaqAnswerer};
use rambo::intent::{Entities, Intent, IntentRecognizer, KeywordRecognizer, Recognition};
use rambo::state::{ConversationSession, MemoryStore, Reservation, StateStore, UserState};
use rambo::{BotError, RestaurantBot};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delegates to the keyword recognizer and counts calls.
#[derive(Default)]
struct CountingRecognizer {
    inner: KeywordRecognizer,
    calls: AtomicUsize,
}

impl CountingRecognizer {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentRecognizer for CountingRecognizer {
    async fn recognize(&self, utterance: &str) -> Result<Recognition, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.recognize(utterance).await
    }
}

/// Always returns one fixed recognition.
struct ScriptedRecognizer(Recognition);

#[async_trait]
impl IntentRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _utterance: &str) -> Result<Recognition, BotError> {
        Ok(self.0.clone())
    }
}

struct MockFaq {
    answers: Vec<FaqAnswer>,
    calls: AtomicUsize,
}

impl MockFaq {
    fn answering(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| FaqAnswer::new(*a, 0.9)).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FaqAnswerer for MockFaq {
    async fn answers(&self, _question: &str) -> Result<Vec<FaqAnswer>, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answers.clone())
    }
}

struct FailingFaq;

#[async_trait]
impl FaqAnswerer for FailingFaq {
    async fn answers(&self, _question: &str) -> Result<Vec<FaqAnswer>, BotError> {
        Err(BotError::Http {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}

struct Harness {
    bot: RestaurantBot,
    recognizer: Arc<CountingRecognizer>,
    conversations: Arc<MemoryStore<ConversationSession>>,
    users: Arc<MemoryStore<UserState>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_faq(Arc::new(MockFaq::answering(&["We are at 12 Harbour Street."])))
    }

    fn with_faq(faq: Arc<dyn FaqAnswerer>) -> Self {
        let recognizer = Arc::new(CountingRecognizer::default());
        let conversations = Arc::new(MemoryStore::new());
        let users = Arc::new(MemoryStore::new());
        let bot = RestaurantBot::new(recognizer.clone(), faq)
            .with_conversation_store(conversations.clone())
            .with_user_store(users.clone());
        Self {
            bot,
            recognizer,
            conversations,
            users,
        }
    }

    async fn say(&self, text: &str) -> Vec<OutboundMessage> {
        self.bot.on_turn(message(text)).await.unwrap()
    }

    async fn session(&self) -> ConversationSession {
        self.conversations.load("conv-1").await.unwrap()
    }

    async fn user(&self) -> UserState {
        self.users.load("user-1").await.unwrap()
    }
}

// A Monday.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

fn user_account() -> ChannelAccount {
    ChannelAccount::new("user-1", "Alice")
}

fn bot_account() -> ChannelAccount {
    ChannelAccount::new("rambo", "rambo")
}

fn message(text: &str) -> Activity {
    Activity::message("conv-1", user_account(), bot_account(), text).at(now())
}

fn contents(responses: &[OutboundMessage]) -> Vec<&str> {
    responses.iter().map(|m| m.content()).collect()
}

#[tokio::test]
async fn books_a_table_end_to_end() {
    let h = Harness::new();

    let r = h.say("book a table").await;
    assert_eq!(
        contents(&r),
        vec!["Would you like to make the reservation (1) yes or (2) no"]
    );

    let r = h.say("yes").await;
    assert_eq!(contents(&r), vec!["Please enter your name."]);

    let r = h.say("Alice").await;
    assert_eq!(
        contents(&r),
        vec!["How many people you wish to make reservation for (0 - 50)?"]
    );

    let r = h.say("5").await;
    assert_eq!(
        contents(&r),
        vec!["Please enter the date you want to make the reservation"]
    );

    let r = h.say("tomorrow").await;
    assert_eq!(contents(&r), vec!["At what time?"]);

    let r = h.say("7pm").await;
    assert_eq!(r.len(), 2);
    assert_eq!(
        r[0].content(),
        "You have entered following values:\nName: Alice\nNumber of people: 5\nDate: 2026-10-20\nTime: 19:00:00"
    );
    assert_eq!(r[1].content(), "Do you want to proceed? (1) yes or (2) no");

    let r = h.say("yes").await;
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].content(), "Reservation Successfully made!");
    assert!(r[1].is_menu());

    let success_count = r
        .iter()
        .filter(|m| m.content() == "Reservation Successfully made!")
        .count();
    assert_eq!(success_count, 1);

    let session = h.session().await;
    assert!(session.previous_intent.intent_name.is_none());
    assert!(session.conversation_data.end_dialog);
    assert!(session.dialog_state.is_none());

    assert_eq!(
        h.user().await.reservations,
        vec![Reservation {
            name: "Alice".to_string(),
            party_size: 5,
            date: "2026-10-20".to_string(),
            time: "19:00:00".to_string(),
        }]
    );
}

#[tokio::test]
async fn mid_dialog_messages_skip_classification() {
    let h = Harness::new();

    h.say("I want to make a reservation").await;
    assert_eq!(h.recognizer.calls(), 1);

    // "cancel" would classify as Cancel_Reservation; mid-dialog it is just an unrecognized answer.
    let r = h.say("cancel").await;
    assert_eq!(
        contents(&r),
        vec!["Would you like to make the reservation (1) yes or (2) no"]
    );
    h.say("yes").await;
    h.say("Bob").await;
    assert_eq!(h.recognizer.calls(), 1);

    let session = h.session().await;
    assert_eq!(
        session.previous_intent.intent_name,
        Some(Intent::MakeReservation)
    );
    assert!(!session.conversation_data.end_dialog);
    assert!(matches!(
        session.dialog_state,
        Some(ActiveDialog::MakeReservation(_))
    ));
}

#[tokio::test]
async fn declining_ends_dialog_and_resends_menu() {
    let h = Harness::new();

    h.say("Make Reservation").await;
    let r = h.say("no").await;
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].content(), "You chose not to make reservation");
    assert!(r[1].is_menu());
    assert_eq!(r[1].content(), MENU_TEXT);

    let session = h.session().await;
    assert!(session.previous_intent.intent_name.is_none());
    assert!(session.dialog_state.is_none());

    // The next message is classified again.
    h.say("book a table").await;
    assert_eq!(h.recognizer.calls(), 2);
}

#[tokio::test]
async fn invalid_party_size_reprompts() {
    let h = Harness::new();
    for text in ["book a table", "yes", "Alice"] {
        h.say(text).await;
    }

    for bad in ["1", "50", "lots"] {
        let r = h.say(bad).await;
        assert_eq!(
            contents(&r),
            vec!["How many people you wish to make reservation for (0 - 50)?"],
            "input {bad}"
        );
    }

    let r = h.say("49").await;
    assert_eq!(
        contents(&r),
        vec!["Please enter the date you want to make the reservation"]
    );
}

#[tokio::test]
async fn entity_party_size_skips_prompt() {
    let h = Harness::new();

    h.say("book a table for 4 people").await;
    h.say("yes").await;
    let r = h.say("Carol").await;
    assert_eq!(
        contents(&r),
        vec!["Please enter the date you want to make the reservation"]
    );

    h.say("friday").await;
    let r = h.say("8pm").await;
    assert!(r[0].content().contains("Number of people: 4"));
    assert!(r[0].content().contains("Date: 2026-10-23"));
}

#[tokio::test]
async fn scripted_entity_outside_range_is_prompted() {
    let recognition = Recognition::new(Intent::MakeReservation)
        .with_entities(Entities::default().with_party_size(120));
    let bot = RestaurantBot::new(
        Arc::new(ScriptedRecognizer(recognition)),
        Arc::new(MockFaq::answering(&[])),
    );

    bot.on_turn(message("a table for 120")).await.unwrap();
    bot.on_turn(message("yes")).await.unwrap();
    let r = bot.on_turn(message("Dave")).await.unwrap();
    assert_eq!(
        contents(&r),
        vec!["How many people you wish to make reservation for (0 - 50)?"]
    );
}

#[tokio::test]
async fn faq_answers_unactionable_messages() {
    let faq = Arc::new(MockFaq::answering(&["We are at 12 Harbour Street.", "ignored"]));
    let h = Harness::with_faq(faq.clone());

    let r = h.say("Restaurant Address").await;
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].content(), "We are at 12 Harbour Street.");
    assert!(r[1].is_menu());
    assert_eq!(faq.calls.load(Ordering::SeqCst), 1);

    let session = h.session().await;
    assert!(session.previous_intent.intent_name.is_none());
    assert!(session.dialog_state.is_none());
}

#[tokio::test]
async fn faq_failure_falls_back() {
    let h = Harness::with_faq(Arc::new(FailingFaq));
    let r = h.say("where are you").await;
    assert_eq!(r[0].content(), "Sorry, I don't have an answer for that.");
    assert!(r[1].is_menu());
}

#[tokio::test]
async fn welcomes_new_members_but_not_the_bot() {
    let h = Harness::new();
    let activity = Activity::members_added(
        "conv-1",
        vec![
            bot_account(),
            ChannelAccount::new("user-1", "Alice"),
            ChannelAccount::new("user-2", "Bob"),
        ],
        bot_account(),
    )
    .at(now());

    let r = h.bot.on_turn(activity).await.unwrap();
    assert_eq!(r.len(), 4);
    assert_eq!(r[0].content(), "Hi Alice. I am rambo bot. How can I help you?");
    assert!(r[1].is_menu());
    assert_eq!(r[2].content(), "Hi Bob. I am rambo bot. How can I help you?");
    assert!(r[3].is_menu());
    assert_eq!(h.recognizer.calls(), 0);
}

#[tokio::test]
async fn cancels_an_existing_booking() {
    let h = Harness::new();
    for text in ["book a table", "yes", "Alice", "3", "2026-10-30", "19:30", "yes"] {
        h.say(text).await;
    }
    assert_eq!(h.user().await.reservations.len(), 1);

    let r = h.say("Cancel Reservation").await;
    assert_eq!(
        contents(&r),
        vec!["Would you like to cancel the reservation (1) yes or (2) no"]
    );

    h.say("yes").await;
    let r = h.say("alice").await;
    assert_eq!(
        contents(&r),
        vec![
            "Reservation for Alice: 3 people on 2026-10-30 at 19:30:00.",
            "Are you sure you want to cancel the reservation? (1) yes or (2) no",
        ]
    );

    let r = h.say("yes").await;
    assert_eq!(r[0].content(), "Reservation successfully cancelled.");
    assert!(r[1].is_menu());
    assert!(h.user().await.reservations.is_empty());
}

#[tokio::test]
async fn cancelling_unknown_name_reports_not_found() {
    let h = Harness::new();
    h.say("cancel my reservation").await;
    h.say("yes").await;
    let r = h.say("Nobody").await;
    assert_eq!(
        contents(&r),
        vec![
            "I could not find a reservation under that name.",
            MENU_TEXT,
        ]
    );
    assert!(h.session().await.previous_intent.intent_name.is_none());
}

#[tokio::test]
async fn conversations_are_isolated() {
    let h = Harness::new();
    h.say("book a table").await;

    let other = Activity::message("conv-2", user_account(), bot_account(), "yes").at(now());
    let r = h.bot.on_turn(other).await.unwrap();

    // conv-2 has no dialog in flight, so "yes" goes to the FAQ.
    assert_eq!(r[0].content(), "We are at 12 Harbour Street.");
    assert_eq!(h.recognizer.calls(), 2);
}
