//! HTTP Surface
//!
//! The gateway upgrade route plus operational endpoints.

pub mod handlers;
pub mod routes;
