//! # Listing Search
//!
//! This crate searches listing inventory across providers. The in-house
//! provider reads persisted listings and filters them by calendar availability;
//! partner providers are reached over the network. The aggregator fans searches
//! out to every provider with a latency bound on partners and routes single
//! lookups to the provider owning the id.

/// Listing, query and error types
mod types;
pub use types::*;

/// Provider-tagged listing identifiers
mod listing_ref;
pub use listing_ref::*;

/// The capability contract every provider implements
mod provider;
pub use provider::*;

/// Bounded-latency helpers
mod timeout;
pub use timeout::*;

/// Persistence contract for in-house listings
mod store;
pub use store::*;

/// The in-house provider
mod beenest;
pub use beenest::*;

/// Partner provider over a JSON inventory API
mod http_provider;
pub use http_provider::*;

/// Fan-out and routing across providers
mod aggregator;
pub use aggregator::*;
