//! Chat Membership Tracker
//!
//! Per-connection cache of the chats this connection has joined.

use std::collections::HashSet;

use crate::domain::{ChatRepository, UserId};

/// Chats joined on one connection.
///
/// Seeded from the store at connect time and then only changed by this
/// connection's own join/leave events. Membership changes made elsewhere are
/// not reflected until the user reconnects.
#[derive(Debug, Default, Clone)]
pub struct ChatMembership {
    chats: HashSet<String>,
}

impl ChatMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the store. A failed lookup leaves the set empty and the
    /// connection proceeds; the user can still join chats explicitly.
    pub async fn load(chats: &dyn ChatRepository, user_id: UserId) -> Self {
        match chats.get_user_chat_rooms(user_id).await {
            Ok(rooms) => {
                tracing::debug!(user_id = user_id, chats = rooms.len(), "Chat memberships loaded");
                rooms.into_iter().collect()
            }
            Err(e) => {
                tracing::warn!(
                    user_id = user_id,
                    error = %e,
                    "Failed to load chat memberships, starting with none"
                );
                Self::new()
            }
        }
    }

    pub fn is_member(&self, chat_id: &str) -> bool {
        self.chats.contains(chat_id)
    }

    /// Returns false if the chat was already present.
    pub fn add(&mut self, chat_id: impl Into<String>) -> bool {
        self.chats.insert(chat_id.into())
    }

    /// Returns false if the chat was not present.
    pub fn remove(&mut self, chat_id: &str) -> bool {
        self.chats.remove(chat_id)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

impl FromIterator<String> for ChatMembership {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            chats: iter.into_iter().collect(),
        }
    }
}
