//! # Web Handlers for the listing search service
//!
//! This crate provides the actix-web handlers, request and response types and
//! the mapping from domain errors to HTTP responses.

/// Request, response and error types
mod types;
pub use types::*;

/// Shared application state
mod state;
pub use state::*;

/// Listing search and lookup handlers
mod listing_handlers;
pub use listing_handlers::*;

/// Calendar feed handlers
mod calendar_handlers;
pub use calendar_handlers::*;

/// Route table
mod routes;
pub use routes::*;
