//! Broadcast Engine
//!
//! Fans one chat event out to every online participant of a chat.

use std::sync::Arc;

use super::events::ChatEvent;
use super::registry::ConnectionRegistry;
use crate::domain::{ChatRepository, UserId};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Reasons a broadcast could not start. Per-recipient failures are not errors.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("failed to resolve participants of chat {chat_id}: {source}")]
    Participants {
        chat_id: String,
        #[source]
        source: AppError,
    },

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-recipient tally of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Frames queued on an online participant's connection
    pub delivered: u64,
    /// Participants with no registered connection
    pub offline: u64,
    /// Online participants whose queue rejected the frame
    pub failed: u64,
}

/// Resolves participants through the store and writes to the registry.
///
/// Delivery is at-most-once and best-effort: persistence has already
/// happened by the time a broadcast runs, and nothing is retried.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    chats: Arc<dyn ChatRepository>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, chats: Arc<dyn ChatRepository>) -> Self {
        Self { registry, chats }
    }

    /// Send `event` to every online participant of `chat_id` except `exclude`.
    pub async fn broadcast(
        &self,
        chat_id: &str,
        event: &ChatEvent,
        exclude: Option<UserId>,
    ) -> Result<BroadcastReport, BroadcastError> {
        let frame = event.to_frame()?;

        let participants = self
            .chats
            .get_chat_participants(chat_id)
            .await
            .map_err(|source| BroadcastError::Participants {
                chat_id: chat_id.to_string(),
                source,
            })?;

        let mut report = BroadcastReport::default();

        for user_id in participants {
            if exclude == Some(user_id) {
                continue;
            }

            let Some(connection) = self.registry.lookup(user_id) else {
                report.offline += 1;
                continue;
            };

            match connection.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        chat_id = %chat_id,
                        recipient = user_id,
                        connection_id = %connection.connection_id(),
                        event = %event.kind(),
                        error = %e,
                        "Failed to deliver broadcast to recipient"
                    );
                }
            }
        }

        metrics::record_broadcast(report.delivered, report.offline, report.failed);

        tracing::trace!(
            chat_id = %chat_id,
            event = %event.kind(),
            delivered = report.delivered,
            offline = report.offline,
            failed = report.failed,
            "Broadcast complete"
        );

        Ok(report)
    }
}
