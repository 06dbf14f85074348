//! WebSocket Gateway
//!
//! Real-time chat sessions over WebSocket: the connection registry,
//! per-connection chat membership, the inbound event router and the
//! broadcast engine that fans events out to online participants.

pub mod broadcast;
mod event_handlers;
pub mod events;
pub mod gateway;
pub mod handler;
pub mod membership;
pub mod registry;
pub mod router;
pub mod session;

pub use broadcast::{BroadcastError, BroadcastReport, Broadcaster};
pub use events::{ChatEvent, EventKind};
pub use gateway::Gateway;
pub use handler::ws_handler;
pub use membership::ChatMembership;
pub use registry::{
    CloseRequest, ConnectionHandle, ConnectionRegistry, DeliveryError, CLOSE_SUPERSEDED,
};
pub use router::{decode_frame, EventError, EventOutcome};
pub use session::Session;
