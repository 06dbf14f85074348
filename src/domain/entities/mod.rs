//! # Domain Entities
//!
//! ## Repository Traits
//!
//! - **ChatRepository**: chat participants, messages, reactions and read
//!   receipts (durable)
//! - **TypingRepository**: short-lived typing markers
//!
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod chat;
mod typing;

pub use chat::{ChatRepository, InsertOutcome, UserId};
pub use typing::TypingRepository;

#[cfg(test)]
pub use chat::MockChatRepository;
#[cfg(test)]
pub use typing::MockTypingRepository;
