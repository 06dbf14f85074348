//! # Domain Layer
//!
//! Storage contracts the chat session layer depends on. Nothing here knows
//! about PostgreSQL, Redis or WebSockets.
//!
//! ## Structure
//!
//! - **entities**: identifiers, insert outcomes and repository traits

pub mod entities;

// Re-export commonly used types
pub use entities::*;
