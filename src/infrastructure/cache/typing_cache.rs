//! Typing Indicator Cache
//!
//! Redis-based storage for typing indicators in chats.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::keys;
use crate::domain::{TypingRepository, UserId};
use crate::shared::error::AppError;

/// Typing indicator cache service
#[derive(Clone)]
pub struct TypingCacheService {
    redis: ConnectionManager,
    typing_ttl: u64,
}

impl TypingCacheService {
    /// Create a service whose markers expire after `typing_ttl` seconds
    pub fn with_ttl(redis: ConnectionManager, typing_ttl: u64) -> Self {
        Self { redis, typing_ttl }
    }

    /// Set user as typing in a chat
    pub async fn mark_typing(&self, chat_id: &str, user_id: UserId) -> Result<(), AppError> {
        let key = keys::typing_marker(chat_id, user_id);
        let set_key = keys::typing_set(chat_id);
        let timestamp = chrono::Utc::now().timestamp();

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, timestamp, self.typing_ttl).await?;

        // Per-chat set, read by the REST layer to list who is typing
        conn.sadd::<_, _, ()>(&set_key, user_id).await?;
        conn.expire::<_, ()>(&set_key, self.typing_ttl as i64).await?;

        Ok(())
    }

    /// Clear typing indicator for a user in a chat
    pub async fn clear_typing(&self, chat_id: &str, user_id: UserId) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(keys::typing_marker(chat_id, user_id)).await?;
        conn.srem::<_, _, ()>(keys::typing_set(chat_id), user_id).await?;
        Ok(())
    }
}

#[async_trait]
impl TypingRepository for TypingCacheService {
    async fn set_typing(
        &self,
        chat_id: &str,
        user_id: UserId,
        is_typing: bool,
    ) -> Result<(), AppError> {
        if is_typing {
            self.mark_typing(chat_id, user_id).await
        } else {
            self.clear_typing(chat_id, user_id).await
        }
    }
}
