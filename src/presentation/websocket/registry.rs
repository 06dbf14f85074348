//! Connection Registry
//!
//! Maps each online user to the outbound handle of their connection.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::UserId;

/// Close code sent to a connection replaced by a newer one for the same user.
pub const CLOSE_SUPERSEDED: u16 = 4000;

/// Why a frame could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection is closed")]
    Closed,
}

/// A pending request to close a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRequest {
    pub code: u16,
    pub reason: &'static str,
}

impl CloseRequest {
    pub fn frame(&self) -> Message {
        Message::Close(Some(CloseFrame {
            code: self.code,
            reason: self.reason.into(),
        }))
    }
}

/// Cloneable write side of one connection.
///
/// Frames go into the connection's bounded queue; a single writer task
/// drains it into the socket, so concurrent senders never interleave.
/// Close requests travel on a separate watch channel so a full queue
/// cannot swallow them.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    connection_id: Uuid,
    user_id: UserId,
    sender: mpsc::Sender<Message>,
    close: Arc<watch::Sender<Option<CloseRequest>>>,
}

impl ConnectionHandle {
    pub fn new(user_id: UserId, sender: mpsc::Sender<Message>) -> Self {
        let (close, _) = watch::channel(None);
        Self {
            connection_id: Uuid::new_v4(),
            user_id,
            sender,
            close: Arc::new(close),
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Queue a frame without waiting.
    pub fn send(&self, message: Message) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Ask the connection to close. Never blocks and never fails, even
    /// when the outbound queue is full or the connection is already gone.
    pub fn close(&self, code: u16, reason: &'static str) {
        self.close.send_replace(Some(CloseRequest { code, reason }));
    }

    /// Receiver that observes close requests for this connection.
    pub fn close_requests(&self) -> watch::Receiver<Option<CloseRequest>> {
        self.close.subscribe()
    }
}

/// Process-wide map of online users, at most one connection each.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Insert or overwrite the user's entry. Returns the replaced handle, if any.
    pub fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let user_id = handle.user_id();
        let previous = self.connections.insert(user_id, handle);

        tracing::debug!(
            user_id = user_id,
            replaced = previous.is_some(),
            "Connection registered"
        );

        previous
    }

    /// Remove the user's entry if present.
    pub fn unregister(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.remove(&user_id).map(|(_, handle)| handle)
    }

    /// Remove the user's entry only while it still belongs to `connection_id`.
    ///
    /// A superseded connection tearing down must not evict its replacement.
    pub fn unregister_connection(&self, user_id: UserId, connection_id: Uuid) -> bool {
        self.connections
            .remove_if(&user_id, |_, handle| handle.connection_id() == connection_id)
            .is_some()
    }

    pub fn lookup(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.connections.contains_key(&user_id)
    }

    /// Number of online users
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
