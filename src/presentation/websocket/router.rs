//! Message Router
//!
//! Decodes inbound text frames and dispatches them to the matching event
//! handler. Nothing here ever answers the client with an error: a rejected
//! frame is logged and dropped, and the read loop moves on.

use super::broadcast::{BroadcastError, BroadcastReport};
use super::events::{ChatEvent, Envelope, EventKind};
use super::gateway::Gateway;
use super::session::Session;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// How a dispatched event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Persisted (where applicable) and fanned out
    Broadcast(BroadcastReport),
    /// Client-generated id already stored; nothing written, nothing sent
    Duplicate,
}

impl EventOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Broadcast(_) => "dispatched",
            EventOutcome::Duplicate => "duplicate",
        }
    }
}

/// Reasons an inbound frame was dropped.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("unknown event type {0:?}")]
    UnknownType(String),

    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} event without chat_id")]
    MissingChatId(EventKind),

    #[error("connection has not joined chat {chat_id}")]
    NotMember { chat_id: String },

    #[error("chat {chat_id} already joined on this connection")]
    AlreadyJoined { chat_id: String },

    #[error("chat {chat_id} not joined on this connection")]
    NotJoined { chat_id: String },

    #[error("user is not a participant of chat {chat_id}")]
    JoinForbidden { chat_id: String },

    #[error("storage failure: {0}")]
    Storage(#[from] AppError),

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl EventError {
    /// Metric label for the drop reason.
    pub fn label(&self) -> &'static str {
        match self {
            EventError::MalformedEnvelope(_) | EventError::MalformedPayload { .. } => "malformed",
            EventError::UnknownType(_) => "unknown_type",
            EventError::MissingChatId(_) => "missing_chat_id",
            EventError::NotMember { .. } | EventError::NotJoined { .. } => "not_member",
            EventError::AlreadyJoined { .. } => "already_joined",
            EventError::JoinForbidden { .. } => "forbidden",
            EventError::Storage(AppError::NotFound(_)) => "not_found",
            EventError::Storage(_) => "storage_error",
            EventError::Encode(_) | EventError::Broadcast(_) => "broadcast_error",
        }
    }

    /// Whether the client sent something it should not have, as opposed to
    /// a server-side failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EventError::Storage(AppError::Database(_))
                | EventError::Storage(AppError::Redis(_))
                | EventError::Storage(AppError::Internal(_))
                | EventError::Encode(_)
                | EventError::Broadcast(_)
        )
    }
}

/// Decode a text frame: the envelope first, then the full variant.
pub fn decode_frame(text: &str) -> Result<ChatEvent, EventError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(EventError::MalformedEnvelope)?;

    let kind =
        EventKind::parse(&envelope.kind).ok_or_else(|| EventError::UnknownType(envelope.kind))?;

    serde_json::from_str(text).map_err(|source| EventError::MalformedPayload { kind, source })
}

impl Gateway {
    /// Handle one inbound text frame to completion. Never fails the connection.
    pub async fn process_frame(&self, session: &mut Session, text: &str) {
        let event = match decode_frame(text) {
            Ok(event) => event,
            Err(e) => {
                reject(session, None, &e);
                return;
            }
        };

        let kind = event.kind();
        match self.dispatch(session, event).await {
            Ok(outcome) => {
                metrics::record_frame(kind.as_str(), outcome.label());
                tracing::trace!(
                    user_id = session.user_id(),
                    event = %kind,
                    outcome = outcome.label(),
                    "Event handled"
                );
            }
            Err(e) => reject(session, Some(kind), &e),
        }
    }

    /// Route a decoded event to its handler.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        event: ChatEvent,
    ) -> Result<EventOutcome, EventError> {
        match event {
            ChatEvent::ChatMessage(e) => self.on_chat_message(session, e).await,
            ChatEvent::Join(e) => self.on_join(session, e).await,
            ChatEvent::Leave(e) => self.on_leave(session, e).await,
            ChatEvent::Reaction(e) => self.on_reaction(session, e).await,
            ChatEvent::ReactionRemoved(e) => self.on_reaction_removed(session, e).await,
            ChatEvent::Typing(e) => self.on_typing(session, e).await,
            ChatEvent::ReadReceipt(e) => self.on_read_receipt(session, e).await,
        }
    }
}

fn reject(session: &Session, kind: Option<EventKind>, error: &EventError) {
    let event = kind.map(|k| k.as_str()).unwrap_or("unknown");
    metrics::record_frame(event, error.label());

    if error.is_client_error() {
        tracing::debug!(
            user_id = session.user_id(),
            connection_id = %session.connection_id(),
            event = event,
            error = %error,
            "Dropping inbound frame"
        );
    } else {
        tracing::error!(
            user_id = session.user_id(),
            connection_id = %session.connection_id(),
            event = event,
            error = %error,
            "Failed to handle inbound frame"
        );
    }
}
