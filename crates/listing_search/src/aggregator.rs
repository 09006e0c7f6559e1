use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::{
    DEFAULT_PROVIDER_TIMEOUT, Listing, ListingError, ListingProvider, ListingRef, LookupOptions,
    NAMESPACE_SEPARATOR, ProviderNamespace, SearchQuery, recover_with_timeout,
};

/// A partner provider registered under a namespace name
#[derive(Clone)]
pub struct PartnerProvider {
    /// Namespace name, the prefix of the partner's listing ids
    pub name: String,
    /// The provider itself
    pub provider: Arc<dyn ListingProvider>,
    /// Latency budget for each search on this partner
    pub timeout: Duration,
}

impl PartnerProvider {
    /// Registers a partner with the default timeout
    pub fn new(name: impl Into<String>, provider: Arc<dyn ListingProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Overrides the latency budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Combines the default provider with partner providers.
///
/// Searches fan out to everyone; single lookups go to exactly the provider
/// that owns the id. The registry is fixed at construction.
pub struct ListingAggregator {
    default_provider: Arc<dyn ListingProvider>,
    partners: Vec<PartnerProvider>,
}

impl ListingAggregator {
    /// Create an aggregator.
    ///
    /// Partner names must be non-empty, unique and free of the namespace
    /// separator. Partner order is the order their results are appended in.
    pub fn new(
        default_provider: Arc<dyn ListingProvider>,
        partners: Vec<PartnerProvider>,
    ) -> Result<Self, ListingError> {
        let mut seen = HashSet::new();
        for partner in &partners {
            if partner.name.is_empty() || partner.name.contains(NAMESPACE_SEPARATOR) {
                return Err(ListingError::InvalidInput(format!(
                    "Invalid partner provider name: '{}'",
                    partner.name
                )));
            }
            if !seen.insert(partner.name.as_str()) {
                return Err(ListingError::InvalidInput(format!(
                    "Duplicate partner provider name: '{}'",
                    partner.name
                )));
            }
        }

        info!(
            "Listing aggregator configured with {} partner providers",
            partners.len()
        );

        Ok(Self {
            default_provider,
            partners,
        })
    }

    /// Names of the registered partners, in registry order
    pub fn partner_names(&self) -> Vec<&str> {
        self.partners.iter().map(|p| p.name.as_str()).collect()
    }

    /// Tags a raw id with the provider that owns it
    pub fn parse_ref(&self, raw: &str) -> ListingRef {
        ListingRef::parse(raw, |name| self.partner(name).is_some())
    }

    fn partner(&self, name: &str) -> Option<&PartnerProvider> {
        self.partners.iter().find(|p| p.name == name)
    }

    fn provider_for(&self, listing: &ListingRef) -> Result<&dyn ListingProvider, ListingError> {
        match &listing.namespace {
            ProviderNamespace::Default => Ok(self.default_provider.as_ref()),
            ProviderNamespace::Partner(name) => self
                .partner(name)
                .map(|p| p.provider.as_ref())
                .ok_or_else(|| ListingError::NotFound(listing.to_string())),
        }
    }

    /// Searches every provider concurrently.
    ///
    /// The default provider is awaited in full and its error is returned.
    /// Each partner contributes nothing when it fails or exceeds its timeout.
    /// Default results come first, then partners in registry order.
    pub async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>, ListingError> {
        let partner_searches = self.partners.iter().map(|partner| {
            let label = format!("Search on partner '{}'", partner.name);
            async move {
                recover_with_timeout(
                    partner.provider.search_listings(query),
                    Vec::new(),
                    partner.timeout,
                    &label,
                )
                .await
            }
        });

        let (default_results, partner_results) = tokio::join!(
            self.default_provider.search_listings(query),
            join_all(partner_searches)
        );

        let mut listings = default_results?;
        for results in partner_results {
            listings.extend(results);
        }

        debug!("Aggregated search returned {} listings", listings.len());
        Ok(listings)
    }

    /// A bookable listing from the owning provider; errors pass through unchanged
    pub async fn find_active_listing(
        &self,
        listing: &ListingRef,
        options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        self.provider_for(listing)?
            .find_active_listing(&listing.local_id, options)
            .await
    }

    /// A listing from the owning provider, active or not
    pub async fn get_listing_by_id(
        &self,
        listing: &ListingRef,
        options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        self.provider_for(listing)?
            .get_listing_by_id(&listing.local_id, options)
            .await
    }
}
