use calendar_sync::{CalendarError, DateRange};
use chrono::NaiveDate;
use geo_query::LocationQuery;
use serde::{Deserialize, Serialize};

/// A listing as returned to callers, whichever provider it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Identifier, namespaced for partner listings (`partner:id`)
    pub id: String,
    /// Name of the provider that owns the listing
    pub provider: String,
    /// Listing title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Free-text address
    pub address: Option<String>,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Maximum number of guests
    pub max_guests: i32,
    /// Minimum stay in nights
    pub minimum_nights: i32,
    /// Nightly price
    pub price_per_night: Option<f64>,
    /// Currency of `price_per_night`
    pub currency: Option<String>,
    /// Whether the listing accepts bookings
    pub is_active: bool,
    /// Busy periods, only filled when requested through [`LookupOptions`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reservations: Vec<DateRange>,
}

/// A listing search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Where to search
    pub location: LocationQuery,
    /// Arrival day
    pub check_in_date: Option<NaiveDate>,
    /// Departure day
    pub check_out_date: Option<NaiveDate>,
    /// Party size, 1 when missing
    pub number_of_guests: Option<u32>,
}

impl SearchQuery {
    /// Requested party size
    pub fn guests(&self) -> u32 {
        self.number_of_guests.unwrap_or(1)
    }

    /// Nights between check-in and check-out when both are given and in order
    pub fn stay_nights(&self) -> Option<i64> {
        match (self.check_in_date, self.check_out_date) {
            (Some(check_in), Some(check_out)) if check_out > check_in => {
                Some((check_out - check_in).num_days())
            }
            _ => None,
        }
    }

    /// Days that must be free, at least one night long.
    ///
    /// A missing check-in is the day before check-out and a missing check-out the
    /// day after check-in. `None` when neither date is given.
    pub fn availability_window(&self) -> Option<DateRange> {
        match (self.check_in_date, self.check_out_date) {
            (None, None) => None,
            (Some(check_in), Some(check_out)) if check_out > check_in => {
                Some(DateRange::new(check_in, check_out))
            }
            (Some(check_in), _) => Some(DateRange::new(check_in, check_in.succ_opt()?)),
            (None, Some(check_out)) => Some(DateRange::new(check_out.pred_opt()?, check_out)),
        }
    }
}

/// Options for single listing lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// Attach the listing's busy periods to the result
    #[serde(default)]
    pub include_reservations: bool,
}

/// Custom error type for listing operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ListingError {
    /// The id is not well formed for the provider
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No listing with this id
    #[error("Listing not found: {0}")]
    NotFound(String),

    /// The listing exists but is deactivated
    #[error("Listing is inactive: {0}")]
    Inactive(String),

    /// Unexpected persistence or network failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CalendarError> for ListingError {
    fn from(e: CalendarError) -> Self {
        ListingError::Internal(e.to_string())
    }
}
