use async_trait::async_trait;
use geo_query::{GeoPoint, SpatialFilter};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{Listing, ListingError};

/// A persisted in-house listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Database id
    pub id: i64,
    /// Listing title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Free-text address, also the target of text location filters
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
}

impl ListingRecord {
    /// Coordinates of the listing when both are known
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    /// Converts the record into the provider-neutral listing shape
    pub fn into_listing(self, provider: &str) -> Listing {
        Listing {
            id: self.id.to_string(),
            provider: provider.to_string(),
            title: self.title,
            description: self.description,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            max_guests: self.max_guests,
            minimum_nights: self.minimum_nights,
            price_per_night: self.price_per_night,
            currency: self.currency,
            is_active: self.is_active,
            reservations: Vec::new(),
        }
    }
}

/// Criteria for a listing search. Only active listings ever match.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    /// Spatial constraint
    pub spatial: SpatialFilter,
    /// Listings must host at least this many guests
    pub min_guests: i32,
    /// When set, listings must accept a stay of this many nights
    pub stay_nights: Option<i64>,
}

impl ListingFilter {
    /// Whether the record satisfies every criterion
    pub fn matches(&self, record: &ListingRecord) -> bool {
        if !record.is_active || record.max_guests < self.min_guests {
            return false;
        }
        if let Some(nights) = self.stay_nights {
            if i64::from(record.minimum_nights) > nights {
                return false;
            }
        }
        match &self.spatial {
            SpatialFilter::None => true,
            SpatialFilter::Range(range) => record.point().is_some_and(|p| range.contains(p)),
            SpatialFilter::Text(text) => {
                let needle = text.to_lowercase();
                record
                    .address
                    .as_ref()
                    .is_some_and(|address| address.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Trait for persisted in-house listings
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Listings matching the filter, in storage order
    async fn find_listings(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingRecord>, ListingError>;

    /// A listing by id, active or not
    async fn find_by_id(&self, id: i64) -> Result<Option<ListingRecord>, ListingError>;
}

/// Listing store kept in process memory, used by tests and local runs
#[derive(Default)]
pub struct InMemoryListingStore {
    records: RwLock<Vec<ListingRecord>>,
}

impl InMemoryListingStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record
    pub async fn insert(&self, record: ListingRecord) {
        let mut records = self.records.write().await;
        records.retain(|existing| existing.id != record.id);
        records.push(record);
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn find_listings(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingRecord>, ListingError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ListingRecord>, ListingError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }
}
