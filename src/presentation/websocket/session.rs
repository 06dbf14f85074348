//! WebSocket Session State

use axum::extract::ws::Message;
use uuid::Uuid;

use super::membership::ChatMembership;
use super::registry::{ConnectionHandle, DeliveryError};
use crate::domain::UserId;

/// State owned by one connection's read loop.
#[derive(Debug)]
pub struct Session {
    handle: ConnectionHandle,
    pub memberships: ChatMembership,
}

impl Session {
    pub fn new(handle: ConnectionHandle, memberships: ChatMembership) -> Self {
        Self {
            handle,
            memberships,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.handle.user_id()
    }

    pub fn connection_id(&self) -> Uuid {
        self.handle.connection_id()
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Queue a frame on this connection's own socket.
    pub fn send(&self, message: Message) -> Result<(), DeliveryError> {
        self.handle.send(message)
    }
}
