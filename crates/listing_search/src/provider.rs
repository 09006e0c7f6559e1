use async_trait::async_trait;

use crate::{Listing, ListingError, LookupOptions, SearchQuery};

/// Trait for listing inventory backends.
///
/// Calls made by the aggregator must not mutate provider state: a search that
/// loses its timeout race is dropped mid-flight.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Listings matching the query
    async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>, ListingError>;

    /// A bookable listing.
    ///
    /// Fails with `InvalidInput` for ids the provider cannot read, `NotFound`
    /// when absent and `Inactive` when deactivated.
    async fn find_active_listing(
        &self,
        id: &str,
        options: LookupOptions,
    ) -> Result<Listing, ListingError>;

    /// A listing regardless of its active flag
    async fn get_listing_by_id(
        &self,
        id: &str,
        options: LookupOptions,
    ) -> Result<Listing, ListingError>;
}
