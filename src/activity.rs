//! Inbound activities, outbound messages and the per-turn context.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The options offered by the suggested-actions menu, in display order.
pub const MENU_ACTIONS: [&str; 3] = ["Make Reservation", "Cancel Reservation", "Restaurant Address"];

/// Prompt text shown above the suggested-actions menu.
pub const MENU_TEXT: &str = "What would you like to do today?";

/// A participant on the channel (a user or the bot itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    pub name: String,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// What happened on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityKind {
    /// A user sent free text.
    Message { text: String },
    /// Members joined the conversation.
    #[serde(rename_all = "camelCase")]
    MembersAdded { members_added: Vec<ChannelAccount> },
}

/// A single inbound event for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub conversation_id: String,
    pub from: ChannelAccount,
    pub recipient: ChannelAccount,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    /// Creates a message activity stamped with the current time.
    pub fn message(
        conversation_id: impl Into<String>,
        from: ChannelAccount,
        recipient: ChannelAccount,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: ActivityKind::Message { text: text.into() },
            conversation_id: conversation_id.into(),
            from,
            recipient,
            timestamp: Utc::now(),
        }
    }

    /// Creates a members-added activity stamped with the current time.
    pub fn members_added(
        conversation_id: impl Into<String>,
        members: Vec<ChannelAccount>,
        recipient: ChannelAccount,
    ) -> Self {
        let from = members
            .first()
            .cloned()
            .unwrap_or_else(|| recipient.clone());
        Self {
            kind: ActivityKind::MembersAdded {
                members_added: members,
            },
            conversation_id: conversation_id.into(),
            from,
            recipient,
            timestamp: Utc::now(),
        }
    }

    /// Overrides the timestamp. Relative dates ("tomorrow") resolve against it.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the message text, if this is a message activity.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ActivityKind::Message { text } => Some(text.as_str()),
            ActivityKind::MembersAdded { .. } => None,
        }
    }
}

/// A reply sent back on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    Text { text: String },
    SuggestedActions { text: String, actions: Vec<String> },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }

    /// The standard three-option menu.
    pub fn menu() -> Self {
        OutboundMessage::SuggestedActions {
            text: MENU_TEXT.to_string(),
            actions: MENU_ACTIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The visible text of the message.
    pub fn content(&self) -> &str {
        match self {
            OutboundMessage::Text { text } => text,
            OutboundMessage::SuggestedActions { text, .. } => text,
        }
    }

    pub fn is_menu(&self) -> bool {
        matches!(self, OutboundMessage::SuggestedActions { .. })
    }
}

/// Per-turn context: the inbound activity plus everything sent during the turn.
#[derive(Debug)]
pub struct TurnContext {
    activity: Activity,
    responses: Vec<OutboundMessage>,
}

impl TurnContext {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            responses: Vec::new(),
        }
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// The calendar day relative dates are resolved against.
    pub fn local_date(&self) -> NaiveDate {
        self.activity.timestamp.date_naive()
    }

    pub fn send(&mut self, message: OutboundMessage) {
        self.responses.push(message);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(OutboundMessage::text(text));
    }

    pub fn send_suggested_actions(&mut self) {
        self.send(OutboundMessage::menu());
    }

    pub fn responses(&self) -> &[OutboundMessage] {
        &self.responses
    }

    /// Consumes the context and returns what was sent during the turn.
    pub fn into_responses(self) -> Vec<OutboundMessage> {
        self.responses
    }
}
