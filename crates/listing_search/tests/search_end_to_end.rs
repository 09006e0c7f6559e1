use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use calendar_sync::{
    CalendarError, CalendarStore, CalendarSyncService, DateRange, FeedFetcher,
    InMemoryCalendarStore, LineICalParser,
};
use chrono::NaiveDate;
use geo_query::{
    Coordinates, GeoError, GeoQuery, GeoQueryConfig, GeocodeHit, Geocoder, LocationQuery,
    Measurement,
};
use listing_search::{
    BeenestListingProvider, InMemoryListingStore, Listing, ListingError, ListingProvider,
    ListingRecord, LookupOptions, SearchQuery,
};

struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<GeocodeHit>, GeoError> {
        Ok(None)
    }
}

struct CannedFetcher {
    documents: HashMap<String, String>,
}

#[async_trait]
impl FeedFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CalendarError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| CalendarError::Fetch(format!("no document at {}", url)))
    }
}

const BOOKED_FEED: &str = "https://calendar.test/1.ics";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(id: i64, lat: f64, address: &str) -> ListingRecord {
    ListingRecord {
        id,
        title: format!("Listing {}", id),
        description: None,
        address: Some(address.to_string()),
        lat: Some(lat),
        lng: Some(-120.0),
        max_guests: 4,
        minimum_nights: 1,
        price_per_night: Some(150.0),
        currency: Some("USD".to_string()),
        is_active: true,
    }
}

struct Fixture {
    provider: BeenestListingProvider,
    calendars: CalendarSyncService,
}

/// Listing 1 sits about 2 km from the search origin, listing 2 about 50 km.
/// Listing 1 is booked from July 2 to July 4, 2025.
async fn fixture() -> Fixture {
    let listings = Arc::new(InMemoryListingStore::new());
    listings
        .insert(record(1, 39.02, "1 Lakeshore Dr, Tahoe City"))
        .await;
    listings.insert(record(2, 39.45, "8 Main St, Truckee")).await;

    let mut small = record(3, 39.01, "3 Pine Rd, Tahoe City");
    small.max_guests = 1;
    small.minimum_nights = 3;
    listings.insert(small).await;

    let mut inactive = record(4, 39.0, "4 Closed Ln, Tahoe City");
    inactive.is_active = false;
    listings.insert(inactive).await;

    let calendar_store: Arc<dyn CalendarStore> = Arc::new(InMemoryCalendarStore::new());
    let fetcher = CannedFetcher {
        documents: HashMap::from([(
            BOOKED_FEED.to_string(),
            [
                "BEGIN:VCALENDAR",
                "BEGIN:VEVENT",
                "DTSTART;VALUE=DATE:20250702",
                "DTEND;VALUE=DATE:20250704",
                "SUMMARY:Reserved",
                "END:VEVENT",
                "END:VCALENDAR",
            ]
            .join("\r\n"),
        )]),
    };
    let calendars = CalendarSyncService::new(
        calendar_store.clone(),
        Arc::new(fetcher),
        Arc::new(LineICalParser),
        None,
    );
    calendars
        .set_feeds(1, vec![BOOKED_FEED.to_string()])
        .await
        .unwrap();

    let geo = GeoQuery::new(Arc::new(NoGeocoder), GeoQueryConfig::default());
    let provider = BeenestListingProvider::new(listings, calendar_store, geo);

    Fixture {
        provider,
        calendars,
    }
}

fn around_origin(radius: f64, measurement: Measurement) -> LocationQuery {
    LocationQuery {
        coordinates: Some(Coordinates {
            lat: Some(39.0),
            lng: Some(-120.0),
            radius: Some(radius),
            measurement: Some(measurement),
        }),
        ..LocationQuery::default()
    }
}

fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.id.as_str()).collect()
}

#[tokio::test]
async fn test_radius_unit_changes_reach() {
    let fixture = fixture().await;

    let near = fixture
        .provider
        .search_listings(&SearchQuery {
            location: around_origin(5.0, Measurement::Km),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&near), vec!["3", "1"]);

    let wide = fixture
        .provider
        .search_listings(&SearchQuery {
            location: around_origin(40.0, Measurement::Mi),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&wide), vec!["3", "1", "2"]);
    assert!(wide.iter().all(|l| l.provider == "beenest"));
}

#[tokio::test]
async fn test_guest_count_and_stay_length_filter() {
    let fixture = fixture().await;

    let couple = fixture
        .provider
        .search_listings(&SearchQuery {
            location: around_origin(5.0, Measurement::Km),
            number_of_guests: Some(2),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&couple), vec!["1"]);

    let short_stay = fixture
        .provider
        .search_listings(&SearchQuery {
            location: around_origin(5.0, Measurement::Km),
            check_in_date: Some(date(2025, 8, 1)),
            check_out_date: Some(date(2025, 8, 3)),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&short_stay), vec!["1"]);
}

#[tokio::test]
async fn test_booked_listing_is_hidden_for_overlapping_stays() {
    let fixture = fixture().await;
    let search = |check_in: Option<NaiveDate>, check_out: Option<NaiveDate>| SearchQuery {
        location: around_origin(40.0, Measurement::Mi),
        check_in_date: check_in,
        check_out_date: check_out,
        ..SearchQuery::default()
    };

    let overlapping = fixture
        .provider
        .search_listings(&search(Some(date(2025, 7, 1)), Some(date(2025, 7, 3))))
        .await
        .unwrap();
    assert_eq!(ids(&overlapping), vec!["2"]);

    // Check-out day of the booking is free again
    let after = fixture
        .provider
        .search_listings(&search(Some(date(2025, 7, 4)), Some(date(2025, 7, 5))))
        .await
        .unwrap();
    assert_eq!(ids(&after), vec!["1", "2"]);

    let arrival_only = fixture
        .provider
        .search_listings(&search(Some(date(2025, 7, 3)), None))
        .await
        .unwrap();
    // No stay length without both dates, so listing 3 is back in
    assert_eq!(ids(&arrival_only), vec!["3", "2"]);

    let departure_only = fixture
        .provider
        .search_listings(&search(None, Some(date(2025, 7, 2))))
        .await
        .unwrap();
    assert_eq!(ids(&departure_only), vec!["3", "1", "2"]);
}

#[tokio::test]
async fn test_clearing_feeds_frees_the_listing() {
    let fixture = fixture().await;
    fixture.calendars.set_feeds(1, vec![]).await.unwrap();

    let results = fixture
        .provider
        .search_listings(&SearchQuery {
            location: around_origin(5.0, Measurement::Km),
            check_in_date: Some(date(2025, 7, 1)),
            check_out_date: Some(date(2025, 7, 3)),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&results), vec!["1"]);
}

#[tokio::test]
async fn test_unknown_place_falls_back_to_address_text() {
    let fixture = fixture().await;

    let results = fixture
        .provider
        .search_listings(&SearchQuery {
            location: LocationQuery {
                location_query: Some("truckee".to_string()),
                ..LocationQuery::default()
            },
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&results), vec!["2"]);
}

#[tokio::test]
async fn test_single_lookups() {
    let fixture = fixture().await;

    let with_reservations = fixture
        .provider
        .find_active_listing(
            "1",
            LookupOptions {
                include_reservations: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        with_reservations.reservations,
        vec![DateRange::new(date(2025, 7, 2), date(2025, 7, 4))]
    );

    let plain = fixture
        .provider
        .find_active_listing("1", LookupOptions::default())
        .await
        .unwrap();
    assert!(plain.reservations.is_empty());

    assert_eq!(
        fixture
            .provider
            .find_active_listing("4", LookupOptions::default())
            .await,
        Err(ListingError::Inactive("4".to_string()))
    );
    let deactivated = fixture
        .provider
        .get_listing_by_id("4", LookupOptions::default())
        .await
        .unwrap();
    assert!(!deactivated.is_active);

    assert_eq!(
        fixture
            .provider
            .find_active_listing("77", LookupOptions::default())
            .await,
        Err(ListingError::NotFound("77".to_string()))
    );
    assert!(matches!(
        fixture
            .provider
            .find_active_listing("partnerA:1", LookupOptions::default())
            .await,
        Err(ListingError::InvalidInput(_))
    ));
}
