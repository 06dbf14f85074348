//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chat_gateway::domain::ChatRepository;
//! use chat_gateway::infrastructure::repositories::PgChatRepository;
//!
//! let chats: Arc<dyn ChatRepository> = Arc::new(PgChatRepository::new(pool.clone()));
//! ```

pub mod chat_repository;

pub use chat_repository::PgChatRepository;
