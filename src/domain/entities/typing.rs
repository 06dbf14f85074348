//! Typing indicator storage contract.

use async_trait::async_trait;

use super::chat::UserId;
use crate::shared::error::AppError;

/// Short-lived "user is typing" markers. Writes are best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TypingRepository: Send + Sync {
    /// Set the marker when `is_typing` is true, clear it otherwise.
    async fn set_typing(
        &self,
        chat_id: &str,
        user_id: UserId,
        is_typing: bool,
    ) -> Result<(), AppError>;
}
