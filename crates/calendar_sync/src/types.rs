use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of feeds refreshed concurrently; batches run one after another
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// A busy period, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First busy day
    pub start: NaiveDate,
    /// First day after the busy period
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new range
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the two half-open ranges share at least one day
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// An external calendar registered for a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeed {
    /// Row identifier
    pub id: Uuid,
    /// Listing the feed belongs to
    pub listing_id: i64,
    /// Remote iCal URL
    pub ical_url: String,
}

/// A busy period parsed from a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationBlock {
    /// Row identifier
    pub id: Uuid,
    /// Listing the block applies to
    pub listing_id: i64,
    /// Feed URL the block was parsed from
    pub source_url: String,
    /// First busy day
    pub start_date: NaiveDate,
    /// First day after the busy period
    pub end_date: NaiveDate,
}

impl ReservationBlock {
    /// The block's period as a [`DateRange`]
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Configuration for calendar synchronization
#[derive(Debug, Clone)]
pub struct CalendarSyncConfig {
    /// Feeds processed concurrently per batch (default: 64)
    pub batch_size: usize,

    /// Interval between scheduled refreshes of every feed (default: 15 minutes)
    pub refresh_interval: Duration,
}

impl Default for CalendarSyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            refresh_interval: Duration::from_secs(15 * 60),
        }
    }
}

/// Custom error type for calendar operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    /// Submitted feed data is invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote calendar could not be downloaded
    #[error("Failed to fetch calendar: {0}")]
    Fetch(String),

    /// The remote calendar is not a usable iCal document
    #[error("Failed to parse calendar: {0}")]
    Parse(String),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
}
