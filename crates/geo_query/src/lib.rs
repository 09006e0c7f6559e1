//! # Geo Query
//!
//! This crate turns the location part of a listing search into a spatial filter.
//! It converts a point and radius into a bounding range, passes explicit bounds
//! through, and falls back to geocoding a free-text location when neither is usable.

/// Types shared by the geo query helpers
mod types;
pub use types::*;

/// Range arithmetic and distance helpers
mod range;
pub use range::*;

/// Geocoding contract and the Nominatim client
mod geocoder;
pub use geocoder::*;

/// Resolution of a location query into a spatial filter
mod resolve;
pub use resolve::*;
