//! Chat Event Types
//!
//! JSON frames exchanged over the chat WebSocket. Every frame is an object
//! with a `type` discriminator and an optional `chat_id`; the remaining
//! fields depend on the type. Fields the server stamps (sender, user and
//! timestamps) are accepted from clients but always overwritten.

use std::fmt;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// Common fields read before the full frame is decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Closed set of event discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChatMessage,
    JoinChat,
    LeaveChat,
    Reaction,
    RemoveReaction,
    Typing,
    ReadReceipt,
}

impl EventKind {
    /// Parse the wire discriminator. Unknown values yield `None`.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "chat_message" => Some(EventKind::ChatMessage),
            "join_chat" => Some(EventKind::JoinChat),
            "leave_chat" => Some(EventKind::LeaveChat),
            "reaction" => Some(EventKind::Reaction),
            "remove_reaction" => Some(EventKind::RemoveReaction),
            "typing" => Some(EventKind::Typing),
            "read_receipt" => Some(EventKind::ReadReceipt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ChatMessage => "chat_message",
            EventKind::JoinChat => "join_chat",
            EventKind::LeaveChat => "leave_chat",
            EventKind::Reaction => "reaction",
            EventKind::RemoveReaction => "remove_reaction",
            EventKind::Typing => "typing",
            EventKind::ReadReceipt => "read_receipt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    #[serde(rename = "chat_message")]
    ChatMessage(ChatMessageEvent),
    #[serde(rename = "join_chat")]
    Join(JoinChatEvent),
    #[serde(rename = "leave_chat")]
    Leave(LeaveChatEvent),
    #[serde(rename = "reaction")]
    Reaction(ReactionEvent),
    #[serde(rename = "remove_reaction")]
    ReactionRemoved(ReactionRemovedEvent),
    #[serde(rename = "typing")]
    Typing(TypingEvent),
    #[serde(rename = "read_receipt")]
    ReadReceipt(ReadReceiptEvent),
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::ChatMessage(_) => EventKind::ChatMessage,
            ChatEvent::Join(_) => EventKind::JoinChat,
            ChatEvent::Leave(_) => EventKind::LeaveChat,
            ChatEvent::Reaction(_) => EventKind::Reaction,
            ChatEvent::ReactionRemoved(_) => EventKind::RemoveReaction,
            ChatEvent::Typing(_) => EventKind::Typing,
            ChatEvent::ReadReceipt(_) => EventKind::ReadReceipt,
        }
    }

    /// Serialize into a text frame ready for an outbound queue.
    pub fn to_frame(&self) -> Result<Message, serde_json::Error> {
        let text = serde_json::to_string(self)?;
        Ok(Message::Text(text.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinChatEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveChatEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub reaction_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub reaction_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reacted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRemovedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub reaction_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub reaction_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub is_typing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceiptEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}
