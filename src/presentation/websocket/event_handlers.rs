//! Event Handlers
//!
//! One handler per event type. Each checks the connection's local chat
//! membership where required, persists through the repository, stamps the
//! server-owned fields and hands the result to the broadcaster.

use chrono::Utc;

use super::events::{
    ChatEvent, ChatMessageEvent, EventKind, JoinChatEvent, LeaveChatEvent, ReactionEvent,
    ReactionRemovedEvent, ReadReceiptEvent, TypingEvent,
};
use super::gateway::Gateway;
use super::router::{EventError, EventOutcome};
use super::session::Session;
use crate::domain::InsertOutcome;

fn require_chat_id(kind: EventKind, chat_id: Option<String>) -> Result<String, EventError> {
    chat_id
        .filter(|id| !id.is_empty())
        .ok_or(EventError::MissingChatId(kind))
}

fn require_membership(session: &Session, chat_id: &str) -> Result<(), EventError> {
    if session.memberships.is_member(chat_id) {
        Ok(())
    } else {
        Err(EventError::NotMember {
            chat_id: chat_id.to_string(),
        })
    }
}

impl Gateway {
    /// Persist and fan out a chat message. Resubmitting a `message_id`
    /// already stored is a silent no-op.
    pub(super) async fn on_chat_message(
        &self,
        session: &mut Session,
        event: ChatMessageEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = require_chat_id(EventKind::ChatMessage, event.chat_id.clone())?;
        require_membership(session, &chat_id)?;

        let sent_at = match self
            .chats
            .add_message(&event.message_id, &chat_id, session.user_id(), &event.content)
            .await?
        {
            InsertOutcome::Inserted(sent_at) => sent_at,
            InsertOutcome::AlreadyExists => {
                tracing::debug!(
                    user_id = session.user_id(),
                    chat_id = %chat_id,
                    message_id = %event.message_id,
                    "Duplicate message ignored"
                );
                return Ok(EventOutcome::Duplicate);
            }
        };

        let outbound = ChatEvent::ChatMessage(ChatMessageEvent {
            chat_id: Some(chat_id.clone()),
            sender_id: Some(session.user_id()),
            sent_at: Some(sent_at),
            ..event
        });

        let report = self.broadcaster.broadcast(&chat_id, &outbound, None).await?;
        Ok(EventOutcome::Broadcast(report))
    }

    /// Join a chat the user belongs to. The joiner gets its acknowledgment
    /// on its own connection; everyone else online gets the broadcast.
    pub(super) async fn on_join(
        &self,
        session: &mut Session,
        event: JoinChatEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = require_chat_id(EventKind::JoinChat, event.chat_id)?;

        if session.memberships.is_member(&chat_id) {
            return Err(EventError::AlreadyJoined { chat_id });
        }

        if !self.chats.is_user_in_chat(session.user_id(), &chat_id).await? {
            return Err(EventError::JoinForbidden { chat_id });
        }

        session.memberships.add(chat_id.clone());

        let outbound = ChatEvent::Join(JoinChatEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            joined_at: Some(Utc::now()),
        });

        let ack = outbound.to_frame().map_err(EventError::Encode)?;
        let ack_result = session.send(ack);

        let mut report = self
            .broadcaster
            .broadcast(&chat_id, &outbound, Some(session.user_id()))
            .await?;

        match ack_result {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    user_id = session.user_id(),
                    chat_id = %chat_id,
                    error = %e,
                    "Failed to acknowledge join"
                );
            }
        }

        Ok(EventOutcome::Broadcast(report))
    }

    /// Leave a chat joined on this connection. Only the local membership
    /// changes; the leaver is still a participant and sees the broadcast.
    pub(super) async fn on_leave(
        &self,
        session: &mut Session,
        event: LeaveChatEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = require_chat_id(EventKind::LeaveChat, event.chat_id)?;

        if !session.memberships.remove(&chat_id) {
            return Err(EventError::NotJoined { chat_id });
        }

        let outbound = ChatEvent::Leave(LeaveChatEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            left_at: Some(Utc::now()),
        });

        let report = self.broadcaster.broadcast(&chat_id, &outbound, None).await?;
        Ok(EventOutcome::Broadcast(report))
    }

    /// Store a reaction. The chat is taken from the reacted message, not
    /// from the frame.
    pub(super) async fn on_reaction(
        &self,
        session: &mut Session,
        event: ReactionEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = self.chats.get_chat_id_for_message(&event.message_id).await?;

        let reacted_at = match self
            .chats
            .add_reaction(
                &event.reaction_id,
                &event.message_id,
                session.user_id(),
                &event.reaction_code,
            )
            .await?
        {
            InsertOutcome::Inserted(reacted_at) => reacted_at,
            InsertOutcome::AlreadyExists => {
                tracing::debug!(
                    user_id = session.user_id(),
                    reaction_id = %event.reaction_id,
                    "Duplicate reaction ignored"
                );
                return Ok(EventOutcome::Duplicate);
            }
        };

        let outbound = ChatEvent::Reaction(ReactionEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            reacted_at: Some(reacted_at),
            ..event
        });

        let report = self.broadcaster.broadcast(&chat_id, &outbound, None).await?;
        Ok(EventOutcome::Broadcast(report))
    }

    /// Relay a reaction removal. Deleting the stored reaction is the REST
    /// layer's job; this only notifies the chat.
    pub(super) async fn on_reaction_removed(
        &self,
        session: &mut Session,
        event: ReactionRemovedEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = self.chats.get_chat_id_for_message(&event.message_id).await?;

        let outbound = ChatEvent::ReactionRemoved(ReactionRemovedEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            removed_at: Some(Utc::now()),
            ..event
        });

        let report = self.broadcaster.broadcast(&chat_id, &outbound, None).await?;
        Ok(EventOutcome::Broadcast(report))
    }

    /// Typing markers are best-effort: a store failure is logged and the
    /// indicator is still relayed to everyone but the typist.
    pub(super) async fn on_typing(
        &self,
        session: &mut Session,
        event: TypingEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = require_chat_id(EventKind::Typing, event.chat_id)?;
        require_membership(session, &chat_id)?;

        if let Err(e) = self
            .typing
            .set_typing(&chat_id, session.user_id(), event.is_typing)
            .await
        {
            tracing::warn!(
                user_id = session.user_id(),
                chat_id = %chat_id,
                error = %e,
                "Failed to store typing indicator"
            );
        }

        let outbound = ChatEvent::Typing(TypingEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            is_typing: event.is_typing,
            timestamp: Some(Utc::now()),
        });

        let report = self
            .broadcaster
            .broadcast(&chat_id, &outbound, Some(session.user_id()))
            .await?;
        Ok(EventOutcome::Broadcast(report))
    }

    /// Read positions are durable: a storage failure abandons the event and
    /// nothing is broadcast.
    pub(super) async fn on_read_receipt(
        &self,
        session: &mut Session,
        event: ReadReceiptEvent,
    ) -> Result<EventOutcome, EventError> {
        let chat_id = require_chat_id(EventKind::ReadReceipt, event.chat_id)?;
        require_membership(session, &chat_id)?;

        let read_at = self
            .chats
            .store_read_receipt(&chat_id, session.user_id(), &event.message_id)
            .await?;

        let outbound = ChatEvent::ReadReceipt(ReadReceiptEvent {
            chat_id: Some(chat_id.clone()),
            user_id: Some(session.user_id()),
            message_id: event.message_id,
            read_at: Some(read_at),
        });

        let report = self
            .broadcaster
            .broadcast(&chat_id, &outbound, Some(session.user_id()))
            .await?;
        Ok(EventOutcome::Broadcast(report))
    }
}
