//! # Calendar Sync
//!
//! This crate keeps listing availability in step with the external iCal feeds
//! hosts register. It owns the feed set of every listing, refreshes feeds in
//! bounded batches and rewrites the reservation blocks the search filters on.

/// Feed, block and error types
mod types;
pub use types::*;

/// Persistence contract and in-memory store
mod store;
pub use store::*;

/// Fetching raw calendar documents
mod fetcher;
pub use fetcher::*;

/// Parsing iCal documents into busy date ranges
mod ical;
pub use ical::*;

/// Per-listing write serialization
mod locks;
pub use locks::*;

/// Feed management and refresh orchestration
mod service;
pub use service::*;

/// Background refresh loop
mod refresher;
pub use refresher::*;
