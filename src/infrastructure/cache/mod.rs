//! Cache Module
//!
//! Redis connection management and the short-lived state kept there.
//! Currently that is only typing indicators; chat membership and messages
//! live in PostgreSQL.

mod typing_cache;

pub use typing_cache::TypingCacheService;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Cache key builders. Every key is namespaced under `chat:`.
pub mod keys {
    use crate::domain::UserId;

    pub const CHAT_TYPING: &str = "chat:typing:";

    /// Per-user typing marker, expires on its own.
    pub fn typing_marker(chat_id: &str, user_id: UserId) -> String {
        format!("{}{}:{}", CHAT_TYPING, chat_id, user_id)
    }

    /// Set of users with a live marker in the chat.
    pub fn typing_set(chat_id: &str) -> String {
        format!("{}{}:users", CHAT_TYPING, chat_id)
    }
}

/// Creates a Redis client without connecting. Used by the readiness check.
pub fn open_redis_client(settings: &RedisSettings) -> Result<Client, redis::RedisError> {
    Client::open(settings.url.as_str())
}

/// Creates a Redis connection manager with automatic reconnection.
///
/// The connection manager handles automatic reconnection when the
/// connection is lost.
#[instrument(skip(client))]
pub async fn create_connection_manager(
    client: Client,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}
