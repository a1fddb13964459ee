//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the codec and media tool endpoints
//! - Request handlers and status code mapping
//! - OpenAPI document
//! - Request logging, body limits and CORS middleware

pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
