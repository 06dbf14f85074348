//! HTTP Handlers

pub mod health;
