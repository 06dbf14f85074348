//! # Chat Gateway Library
//!
//! Real-time chat session layer over WebSocket:
//! - authenticated connections, one per user, tracked in a registry
//! - per-connection chat membership seeded from PostgreSQL
//! - typed inbound events routed to handlers that persist and fan out
//! - typing indicators kept in Redis with a short TTL
//!
//! ## Module Structure
//!
//! ```text
//! chat_gateway/
//! +-- config/          Configuration management
//! +-- domain/          Repository traits and identifiers
//! +-- infrastructure/  PostgreSQL, Redis and metrics
//! +-- presentation/    HTTP routes, auth and the WebSocket gateway
//! +-- shared/          Error types
//! ```

// Configuration module
pub mod config;

// Domain layer - storage contracts
pub mod domain;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
