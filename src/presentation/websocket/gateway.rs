//! WebSocket Gateway
//!
//! Owns the connection registry and the collaborators every event handler
//! needs, and manages the connect/disconnect lifecycle.

use std::sync::Arc;

use super::broadcast::Broadcaster;
use super::membership::ChatMembership;
use super::registry::{ConnectionHandle, ConnectionRegistry, CLOSE_SUPERSEDED};
use super::session::Session;
use crate::domain::{ChatRepository, TypingRepository};
use crate::infrastructure::metrics;

/// Chat session gateway shared by all connections.
pub struct Gateway {
    pub(super) registry: Arc<ConnectionRegistry>,
    pub(super) broadcaster: Broadcaster,
    pub(super) chats: Arc<dyn ChatRepository>,
    pub(super) typing: Arc<dyn TypingRepository>,
}

impl Gateway {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        chats: Arc<dyn ChatRepository>,
        typing: Arc<dyn TypingRepository>,
    ) -> Self {
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&chats));
        Self {
            registry,
            broadcaster,
            chats,
            typing,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Number of users with a registered connection
    pub fn online_count(&self) -> usize {
        self.registry.len()
    }

    /// Register a freshly authenticated connection and seed its memberships.
    ///
    /// If the user already had a connection, that one is told to close
    /// through its close signal, whatever the state of its outbound queue.
    /// Its own teardown will not touch the new registry entry.
    pub async fn connect(&self, handle: ConnectionHandle) -> Session {
        let user_id = handle.user_id();
        let connection_id = handle.connection_id();

        if let Some(previous) = self.registry.register(handle.clone()) {
            if previous.connection_id() != connection_id {
                tracing::info!(
                    user_id = user_id,
                    previous_connection_id = %previous.connection_id(),
                    connection_id = %connection_id,
                    "Closing connection superseded by a newer one"
                );
                previous.close(CLOSE_SUPERSEDED, "superseded by a newer connection");
            }
        }

        let memberships = ChatMembership::load(self.chats.as_ref(), user_id).await;
        metrics::add_websocket_connections(1.0);

        tracing::info!(
            user_id = user_id,
            connection_id = %connection_id,
            chats = memberships.len(),
            "Session registered"
        );

        Session::new(handle, memberships)
    }

    /// Tear down a session. Safe to call for a superseded connection.
    pub fn disconnect(&self, session: &Session) {
        let removed = self
            .registry
            .unregister_connection(session.user_id(), session.connection_id());
        metrics::add_websocket_connections(-1.0);

        tracing::info!(
            user_id = session.user_id(),
            connection_id = %session.connection_id(),
            registry_entry_removed = removed,
            "Session unregistered"
        );
    }
}
