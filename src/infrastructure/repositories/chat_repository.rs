//! Chat Repository Implementation
//!
//! PostgreSQL implementation of the chat session layer's persistence needs:
//! membership lookups, idempotent message/reaction inserts and read positions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChatRepository, InsertOutcome, UserId};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// PostgreSQL chat repository implementation.
///
/// Client-generated ids are primary keys, so a resubmitted message or
/// reaction hits `ON CONFLICT DO NOTHING` and comes back as
/// [`InsertOutcome::AlreadyExists`] instead of a unique-violation error.
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    /// Creates a new PgChatRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn outcome_from_row(row: Option<DateTime<Utc>>) -> InsertOutcome<DateTime<Utc>> {
    match row {
        Some(at) => InsertOutcome::Inserted(at),
        None => InsertOutcome::AlreadyExists,
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn get_user_chat_rooms(&self, user_id: UserId) -> Result<Vec<String>, AppError> {
        let timer = metrics::DbTimer::start("select", "chat_participants");
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT chat_id
            FROM chat_participants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        timer.finish();

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn is_user_in_chat(&self, user_id: UserId, chat_id: &str) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM chat_participants
                WHERE user_id = $1 AND chat_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(chat_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Uses INSERT ON CONFLICT so a duplicate message id yields no row.
    async fn add_message(
        &self,
        message_id: &str,
        chat_id: &str,
        user_id: UserId,
        content: &str,
    ) -> Result<InsertOutcome<DateTime<Utc>>, AppError> {
        let timer = metrics::DbTimer::start("insert", "messages");
        let sent_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            RETURNING sent_at
            "#,
        )
        .bind(message_id)
        .bind(chat_id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        timer.finish();

        Ok(outcome_from_row(sent_at))
    }

    async fn add_reaction(
        &self,
        reaction_id: &str,
        message_id: &str,
        user_id: UserId,
        reaction_code: &str,
    ) -> Result<InsertOutcome<DateTime<Utc>>, AppError> {
        let timer = metrics::DbTimer::start("insert", "message_reactions");
        let reacted_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO message_reactions (id, message_id, user_id, reaction_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            RETURNING reacted_at
            "#,
        )
        .bind(reaction_id)
        .bind(message_id)
        .bind(user_id)
        .bind(reaction_code)
        .fetch_optional(&self.pool)
        .await?;
        timer.finish();

        Ok(outcome_from_row(reacted_at))
    }

    async fn get_chat_id_for_message(&self, message_id: &str) -> Result<String, AppError> {
        sqlx::query_scalar::<_, String>("SELECT chat_id FROM messages WHERE id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {} not found", message_id)))
    }

    async fn get_chat_participants(&self, chat_id: &str) -> Result<Vec<UserId>, AppError> {
        let timer = metrics::DbTimer::start("select", "chat_participants");
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM chat_participants
            WHERE chat_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        timer.finish();

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Upserts the user's read position; the latest receipt wins.
    async fn store_read_receipt(
        &self,
        chat_id: &str,
        user_id: UserId,
        message_id: &str,
    ) -> Result<DateTime<Utc>, AppError> {
        let read_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO read_receipts (chat_id, user_id, message_id, read_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (chat_id, user_id)
            DO UPDATE SET message_id = EXCLUDED.message_id, read_at = EXCLUDED.read_at
            RETURNING read_at
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(message_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(read_at)
    }
}
