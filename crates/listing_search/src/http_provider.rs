use std::time::Duration;

use async_trait::async_trait;
use geo_query::Measurement;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{Listing, ListingError, ListingProvider, ListingRef, LookupOptions, SearchQuery};

/// Listing as served by a partner inventory API
#[derive(Debug, Deserialize)]
pub struct PartnerListing {
    /// Partner's own id
    pub id: String,
    /// Listing title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text address
    #[serde(default)]
    pub address: Option<String>,
    /// Latitude
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub lng: Option<f64>,
    /// Maximum number of guests
    pub max_guests: i32,
    /// Minimum stay in nights
    #[serde(default = "default_minimum_nights")]
    pub minimum_nights: i32,
    /// Nightly price
    #[serde(default)]
    pub price_per_night: Option<f64>,
    /// Currency of `price_per_night`
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether the partner still offers the listing
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_minimum_nights() -> i32 {
    1
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PartnerSearchResponse {
    listings: Vec<PartnerListing>,
}

/// Provider backed by a partner's JSON inventory API.
///
/// Expects `GET {base_url}/listings` for searches and
/// `GET {base_url}/listings/{id}` for single listings.
pub struct HttpListingProvider {
    name: String,
    client: Client,
    base_url: String,
}

impl HttpListingProvider {
    /// Create a client for the partner registered under `name`
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ListingError> {
        let client = Client::builder()
            .user_agent("BeenestListingSearch/1.0")
            .timeout(timeout)
            .build()
            .map_err(|e| ListingError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Name the provider is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    fn to_listing(&self, partner: PartnerListing) -> Listing {
        Listing {
            id: ListingRef::partner(self.name.as_str(), partner.id).to_string(),
            provider: self.name.clone(),
            title: partner.title,
            description: partner.description,
            address: partner.address,
            lat: partner.lat,
            lng: partner.lng,
            max_guests: partner.max_guests,
            minimum_nights: partner.minimum_nights,
            price_per_night: partner.price_per_night,
            currency: partner.currency,
            is_active: partner.active,
            reservations: Vec::new(),
        }
    }

    async fn fetch_listing(&self, id: &str) -> Result<PartnerListing, ListingError> {
        let url = format!("{}/listings/{}", self.base_url, urlencoding::encode(id));
        debug!("Fetching {} listing {}", self.name, id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ListingError::Internal(format!("HTTP request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ListingError::NotFound(id.to_string())),
            status if !status.is_success() => {
                return Err(ListingError::Internal(format!(
                    "{} returned HTTP {}",
                    self.name, status
                )));
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| ListingError::Internal(format!("Failed to parse response: {}", e)))
    }
}

/// Query string for a partner search; unset fields are left out
fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("guests", query.guests().to_string())];

    if let Some(coordinates) = query.location.coordinates.as_ref() {
        if let Some(point) = coordinates.point() {
            params.push(("lat", point.lat.to_string()));
            params.push(("lng", point.lng.to_string()));

            if let Some(radius) = coordinates.radius.filter(|r| r.is_finite() && *r > 0.0) {
                params.push(("radius", radius.to_string()));
            }
            if let Some(measurement) = coordinates.measurement {
                let unit = match measurement {
                    Measurement::Km => "KM",
                    Measurement::Mi => "MI",
                };
                params.push(("measurement", unit.to_string()));
            }
        }
    }
    if let Some(bounds) = query.location.bounds.as_ref().and_then(|b| b.bounding_box()) {
        params.push(("north", bounds.north.to_string()));
        params.push(("south", bounds.south.to_string()));
        params.push(("east", bounds.east.to_string()));
        params.push(("west", bounds.west.to_string()));
    }
    if let Some(text) = query.location.location_query.as_deref() {
        let text = text.trim();
        if !text.is_empty() {
            params.push(("location", text.to_string()));
        }
    }
    if let Some(check_in) = query.check_in_date {
        params.push(("check_in", check_in.to_string()));
    }
    if let Some(check_out) = query.check_out_date {
        params.push(("check_out", check_out.to_string()));
    }

    params
}

#[async_trait]
impl ListingProvider for HttpListingProvider {
    async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>, ListingError> {
        let url = format!("{}/listings", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&search_params(query))
            .send()
            .await
            .map_err(|e| ListingError::Internal(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ListingError::Internal(format!(
                "{} search returned HTTP {}",
                self.name,
                response.status()
            )));
        }

        let body: PartnerSearchResponse = response
            .json()
            .await
            .map_err(|e| ListingError::Internal(format!("Failed to parse response: {}", e)))?;

        debug!("{} returned {} listings", self.name, body.listings.len());

        Ok(body
            .listings
            .into_iter()
            .filter(|listing| listing.active)
            .map(|listing| self.to_listing(listing))
            .collect())
    }

    async fn find_active_listing(
        &self,
        id: &str,
        _options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        let listing = self.fetch_listing(id).await?;
        if !listing.active {
            return Err(ListingError::Inactive(id.to_string()));
        }
        Ok(self.to_listing(listing))
    }

    async fn get_listing_by_id(
        &self,
        id: &str,
        _options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        let listing = self.fetch_listing(id).await?;
        Ok(self.to_listing(listing))
    }
}
