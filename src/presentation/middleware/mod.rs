//! Middleware
//!
//! Tower layers and request extractors shared by the HTTP routes.

pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{decode_user_id, AuthUser, Claims};
