//! # Postgres
//!
//! PostgreSQL persistence for listings, calendar feeds and reservation blocks.
//! The stores here implement the storage contracts of `listing_search` and
//! `calendar_sync`; every `sqlx` error is mapped into those crates' error
//! types so nothing database specific leaks past this crate.

/// Pool creation, connectivity check and migrations
pub mod database;

/// `ListingStore` over the `listings` table
mod listing_store;
pub use listing_store::PgListingStore;

/// `CalendarStore` over the `calendar_feeds` and `reservation_blocks` tables
mod calendar_store;
pub use calendar_store::PgCalendarStore;
