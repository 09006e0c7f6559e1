use std::sync::Arc;

use calendar_sync::CalendarSyncService;
use listing_search::ListingAggregator;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Search and lookup across providers
    pub aggregator: Arc<ListingAggregator>,
    /// Calendar feed management for in-house listings
    pub calendars: Arc<CalendarSyncService>,
}

impl AppState {
    /// Bundles the services
    pub fn new(aggregator: Arc<ListingAggregator>, calendars: Arc<CalendarSyncService>) -> Self {
        Self {
            aggregator,
            calendars,
        }
    }
}
