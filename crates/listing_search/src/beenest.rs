use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use calendar_sync::CalendarStore;
use geo_query::{GeoPoint, GeoQuery, distance_km};
use tracing::debug;

use crate::{
    Listing, ListingError, ListingFilter, ListingProvider, ListingRecord, ListingStore,
    LookupOptions, SearchQuery,
};

/// Provider name reported on in-house listings
pub const BEENEST_PROVIDER_NAME: &str = "beenest";

/// The in-house inventory: persisted listings plus synced calendar blocks
pub struct BeenestListingProvider {
    listings: Arc<dyn ListingStore>,
    calendars: Arc<dyn CalendarStore>,
    geo: GeoQuery,
}

impl BeenestListingProvider {
    /// Creates the provider over its stores and query resolver
    pub fn new(
        listings: Arc<dyn ListingStore>,
        calendars: Arc<dyn CalendarStore>,
        geo: GeoQuery,
    ) -> Self {
        Self {
            listings,
            calendars,
            geo,
        }
    }

    async fn load(&self, id: &str) -> Result<ListingRecord, ListingError> {
        let numeric_id = parse_listing_id(id)?;
        self.listings
            .find_by_id(numeric_id)
            .await?
            .ok_or_else(|| ListingError::NotFound(id.to_string()))
    }

    async fn to_listing(
        &self,
        record: ListingRecord,
        options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        let listing_id = record.id;
        let mut listing = record.into_listing(BEENEST_PROVIDER_NAME);
        if options.include_reservations {
            listing.reservations = self
                .calendars
                .find_blocks(listing_id)
                .await?
                .iter()
                .map(|block| block.range())
                .collect();
        }
        Ok(listing)
    }
}

#[async_trait]
impl ListingProvider for BeenestListingProvider {
    async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>, ListingError> {
        let resolved = self.geo.resolve(&query.location).await;
        let filter = ListingFilter {
            spatial: resolved.filter,
            min_guests: i32::try_from(query.guests()).unwrap_or(i32::MAX),
            stay_nights: query.stay_nights(),
        };

        let mut records = self.listings.find_listings(&filter).await?;
        if let Some(origin) = resolved.used_coordinates {
            sort_by_distance(&mut records, origin);
        }

        if let Some(window) = query.availability_window() {
            let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
            let busy: HashSet<i64> = self
                .calendars
                .find_overlapping_blocks(&ids, window)
                .await?
                .into_iter()
                .map(|block| block.listing_id)
                .collect();
            records.retain(|record| !busy.contains(&record.id));
        }

        debug!("In-house search matched {} listings", records.len());

        Ok(records
            .into_iter()
            .map(|record| record.into_listing(BEENEST_PROVIDER_NAME))
            .collect())
    }

    async fn find_active_listing(
        &self,
        id: &str,
        options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        let record = self.load(id).await?;
        if !record.is_active {
            return Err(ListingError::Inactive(id.to_string()));
        }
        self.to_listing(record, options).await
    }

    async fn get_listing_by_id(
        &self,
        id: &str,
        options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        let record = self.load(id).await?;
        self.to_listing(record, options).await
    }
}

/// In-house ids are positive integers
fn parse_listing_id(id: &str) -> Result<i64, ListingError> {
    match id.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ListingError::InvalidInput(format!(
            "Listing id must be a positive integer: {}",
            id
        ))),
    }
}

/// Nearest first; listings without coordinates go last in their original order
fn sort_by_distance(records: &mut [ListingRecord], origin: GeoPoint) {
    records.sort_by(|a, b| {
        match (
            a.point().map(|p| distance_km(origin, p)),
            b.point().map(|p| distance_km(origin, p)),
        ) {
            (Some(da), Some(db)) => da.total_cmp(&db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}
