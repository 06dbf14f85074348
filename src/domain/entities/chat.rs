//! Chat persistence contract.
//!
//! The chat session layer never touches SQL directly. Everything it needs
//! from the relational store goes through [`ChatRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::error::AppError;

/// Numeric user identity, as carried in the verified token's `sub` claim.
pub type UserId = i64;

/// Result of an idempotent insert keyed by a client-generated identifier.
///
/// A second insert with the same identifier is not an error: the store
/// reports `AlreadyExists` and the caller treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The row was written; carries the server-assigned value (usually a timestamp).
    Inserted(T),
    /// A row with the same identifier already existed. Nothing was written.
    AlreadyExists,
}

/// Repository trait for chat membership, message and receipt storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// All chat ids the user is a participant of.
    async fn get_user_chat_rooms(&self, user_id: UserId) -> Result<Vec<String>, AppError>;

    /// Whether the user is a participant of the chat.
    async fn is_user_in_chat(&self, user_id: UserId, chat_id: &str) -> Result<bool, AppError>;

    /// Append a message. Returns the server-assigned `sent_at` on insert.
    async fn add_message(
        &self,
        message_id: &str,
        chat_id: &str,
        user_id: UserId,
        content: &str,
    ) -> Result<InsertOutcome<DateTime<Utc>>, AppError>;

    /// Append a reaction. Returns the server-assigned `reacted_at` on insert.
    async fn add_reaction(
        &self,
        reaction_id: &str,
        message_id: &str,
        user_id: UserId,
        reaction_code: &str,
    ) -> Result<InsertOutcome<DateTime<Utc>>, AppError>;

    /// Chat a message belongs to. `AppError::NotFound` if the message is unknown.
    async fn get_chat_id_for_message(&self, message_id: &str) -> Result<String, AppError>;

    /// Every participant of the chat, online or not.
    async fn get_chat_participants(&self, chat_id: &str) -> Result<Vec<UserId>, AppError>;

    /// Move the user's read position in the chat to `message_id`.
    async fn store_read_receipt(
        &self,
        chat_id: &str,
        user_id: UserId,
        message_id: &str,
    ) -> Result<DateTime<Utc>, AppError>;
}
