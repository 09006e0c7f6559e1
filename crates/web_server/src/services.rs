use std::sync::Arc;

use calendar_sync::{CalendarStore, CalendarSyncService, HttpFeedFetcher, LineICalParser};
use geo_query::{GeoQuery, NominatimGeocoder};
use listing_search::{
    BeenestListingProvider, HttpListingProvider, ListingAggregator, PartnerProvider,
};
use postgres::{PgCalendarStore, PgListingStore};
use sqlx::PgPool;
use tracing::info;
use web_handlers::AppState;

use crate::config::AppConfig;

/// Timeout of a single calendar download
const FEED_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Every long-lived service of the server, wired once at startup
pub struct AppServices {
    /// Search and lookup across providers
    pub aggregator: Arc<ListingAggregator>,
    /// Calendar feed management
    pub calendars: Arc<CalendarSyncService>,
}

impl AppServices {
    /// Builds the service graph over the database pool
    pub fn build(
        config: &AppConfig,
        pool: PgPool,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let calendar_store: Arc<dyn CalendarStore> = Arc::new(PgCalendarStore::new(pool.clone()));
        let calendars = Arc::new(CalendarSyncService::new(
            calendar_store.clone(),
            Arc::new(HttpFeedFetcher::new(FEED_FETCH_TIMEOUT)?),
            Arc::new(LineICalParser),
            Some(config.calendar.clone()),
        ));

        let geocoder = Arc::new(NominatimGeocoder::new(config.geocoder.clone())?);
        let geo = GeoQuery::new(geocoder, config.geo.clone());
        let beenest = Arc::new(BeenestListingProvider::new(
            Arc::new(PgListingStore::new(pool)),
            calendar_store,
            geo,
        ));

        let mut partners = Vec::with_capacity(config.partners.len());
        for endpoint in &config.partners {
            let provider = HttpListingProvider::new(
                endpoint.name.clone(),
                endpoint.base_url.clone(),
                config.partner_timeout,
            )?;
            info!(
                "Registered partner provider '{}' at {}",
                endpoint.name, endpoint.base_url
            );
            partners.push(
                PartnerProvider::new(endpoint.name.clone(), Arc::new(provider))
                    .with_timeout(config.partner_timeout),
            );
        }

        let aggregator = Arc::new(ListingAggregator::new(beenest, partners)?);

        Ok(Self {
            aggregator,
            calendars,
        })
    }

    /// State handed to the HTTP handlers
    pub fn state(&self) -> AppState {
        AppState::new(self.aggregator.clone(), self.calendars.clone())
    }
}
