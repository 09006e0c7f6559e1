use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use listing_search::{
    Listing, ListingAggregator, ListingError, ListingProvider, ListingRef, LookupOptions,
    PartnerProvider, SearchQuery,
};
use tokio::time::{Instant, sleep};

enum Behavior {
    Respond(Vec<Listing>, Duration),
    Hang,
    Fail,
}

struct StubProvider {
    name: &'static str,
    behavior: Behavior,
    lookups: Mutex<Vec<String>>,
}

impl StubProvider {
    fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            lookups: Mutex::new(Vec::new()),
        })
    }

    fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingProvider for StubProvider {
    async fn search_listings(&self, _query: &SearchQuery) -> Result<Vec<Listing>, ListingError> {
        match &self.behavior {
            Behavior::Respond(listings, delay) => {
                sleep(*delay).await;
                Ok(listings.clone())
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::Fail => Err(ListingError::Internal(format!("{} is down", self.name))),
        }
    }

    async fn find_active_listing(
        &self,
        id: &str,
        _options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        self.lookups.lock().unwrap().push(format!("active:{}", id));
        match id {
            "404" => Err(ListingError::NotFound(id.to_string())),
            "410" => Err(ListingError::Inactive(id.to_string())),
            _ => Ok(listing(id, self.name)),
        }
    }

    async fn get_listing_by_id(
        &self,
        id: &str,
        _options: LookupOptions,
    ) -> Result<Listing, ListingError> {
        self.lookups.lock().unwrap().push(format!("get:{}", id));
        Ok(listing(id, self.name))
    }
}

fn listing(id: &str, provider: &str) -> Listing {
    Listing {
        id: id.to_string(),
        provider: provider.to_string(),
        title: format!("Listing {}", id),
        description: None,
        address: None,
        lat: None,
        lng: None,
        max_guests: 2,
        minimum_nights: 1,
        price_per_night: None,
        currency: None,
        is_active: true,
        reservations: Vec::new(),
    }
}

fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.id.as_str()).collect()
}

fn instant(listings: Vec<Listing>) -> Behavior {
    Behavior::Respond(listings, Duration::ZERO)
}

#[tokio::test(start_paused = true)]
async fn test_hanging_partner_is_cut_off_at_timeout() {
    let default = StubProvider::new("beenest", instant(vec![listing("L1", "beenest")]));
    let partner = StubProvider::new("partnerA", Behavior::Hang);
    let aggregator =
        ListingAggregator::new(default, vec![PartnerProvider::new("partnerA", partner)]).unwrap();

    let started = Instant::now();
    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["L1"]);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4000));
    assert!(elapsed < Duration::from_millis(4100));
}

#[tokio::test(start_paused = true)]
async fn test_fast_partner_results_follow_default() {
    let default = StubProvider::new("beenest", instant(vec![listing("L1", "beenest")]));
    let partner = StubProvider::new(
        "partnerA",
        Behavior::Respond(
            vec![listing("partnerA:L2", "partnerA")],
            Duration::from_millis(10),
        ),
    );
    let aggregator =
        ListingAggregator::new(default, vec![PartnerProvider::new("partnerA", partner)]).unwrap();

    let started = Instant::now();
    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["L1", "partnerA:L2"]);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_partner_results_keep_registry_order() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let slow = StubProvider::new(
        "slow",
        Behavior::Respond(vec![listing("slow:1", "slow")], Duration::from_millis(300)),
    );
    let fast = StubProvider::new("fast", instant(vec![listing("fast:1", "fast")]));
    let aggregator = ListingAggregator::new(
        default,
        vec![
            PartnerProvider::new("slow", slow),
            PartnerProvider::new("fast", fast),
        ],
    )
    .unwrap();

    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["slow:1", "fast:1"]);
}

#[tokio::test(start_paused = true)]
async fn test_partners_run_concurrently() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let partners = (0..3)
        .map(|i| {
            let name: &'static str = ["a", "b", "c"][i];
            PartnerProvider::new(
                name,
                StubProvider::new(
                    name,
                    Behavior::Respond(vec![listing(name, name)], Duration::from_millis(1000)),
                ),
            )
        })
        .collect();
    let aggregator = ListingAggregator::new(default, partners).unwrap();

    let started = Instant::now();
    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_per_partner_timeout_override() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let partner = StubProvider::new(
        "partnerA",
        Behavior::Respond(vec![listing("partnerA:1", "partnerA")], Duration::from_millis(500)),
    );
    let aggregator = ListingAggregator::new(
        default,
        vec![PartnerProvider::new("partnerA", partner).with_timeout(Duration::from_millis(200))],
    )
    .unwrap();

    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_failing_partner_contributes_nothing() {
    let default = StubProvider::new("beenest", instant(vec![listing("L1", "beenest")]));
    let partner = StubProvider::new("partnerA", Behavior::Fail);
    let aggregator =
        ListingAggregator::new(default, vec![PartnerProvider::new("partnerA", partner)]).unwrap();

    let results = aggregator
        .search_listings(&SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["L1"]);
}

#[tokio::test]
async fn test_default_provider_error_propagates() {
    let default = StubProvider::new("beenest", Behavior::Fail);
    let partner = StubProvider::new("partnerA", instant(vec![listing("partnerA:1", "partnerA")]));
    let aggregator =
        ListingAggregator::new(default, vec![PartnerProvider::new("partnerA", partner)]).unwrap();

    let result = aggregator.search_listings(&SearchQuery::default()).await;

    assert!(matches!(result, Err(ListingError::Internal(_))));
}

#[tokio::test]
async fn test_lookups_reach_exactly_one_provider() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let partner_a = StubProvider::new("partnerA", instant(vec![]));
    let partner_b = StubProvider::new("partnerB", instant(vec![]));
    let aggregator = ListingAggregator::new(
        default.clone(),
        vec![
            PartnerProvider::new("partnerA", partner_a.clone()),
            PartnerProvider::new("partnerB", partner_b.clone()),
        ],
    )
    .unwrap();

    let partner_ref = aggregator.parse_ref("partnerA:123");
    let found = aggregator
        .find_active_listing(&partner_ref, LookupOptions::default())
        .await
        .unwrap();
    assert_eq!(found.provider, "partnerA");

    let default_ref = aggregator.parse_ref("999");
    aggregator
        .get_listing_by_id(&default_ref, LookupOptions::default())
        .await
        .unwrap();

    assert_eq!(partner_a.lookups(), vec!["active:123"]);
    assert_eq!(default.lookups(), vec!["get:999"]);
    assert!(partner_b.lookups().is_empty());
}

#[tokio::test]
async fn test_unknown_prefix_goes_to_default_whole() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let partner = StubProvider::new("partnerA", instant(vec![]));
    let aggregator = ListingAggregator::new(
        default.clone(),
        vec![PartnerProvider::new("partnerA", partner.clone())],
    )
    .unwrap();

    let listing_ref = aggregator.parse_ref("airbnb:42");
    assert_eq!(listing_ref, ListingRef::default_provider("airbnb:42"));

    aggregator
        .find_active_listing(&listing_ref, LookupOptions::default())
        .await
        .unwrap();

    assert_eq!(default.lookups(), vec!["active:airbnb:42"]);
    assert!(partner.lookups().is_empty());
}

#[tokio::test]
async fn test_lookup_errors_pass_through() {
    let default = StubProvider::new("beenest", instant(vec![]));
    let partner = StubProvider::new("partnerA", instant(vec![]));
    let aggregator =
        ListingAggregator::new(default, vec![PartnerProvider::new("partnerA", partner)]).unwrap();

    let missing = aggregator
        .find_active_listing(&aggregator.parse_ref("partnerA:404"), LookupOptions::default())
        .await;
    assert_eq!(missing, Err(ListingError::NotFound("404".to_string())));

    let inactive = aggregator
        .find_active_listing(&aggregator.parse_ref("410"), LookupOptions::default())
        .await;
    assert_eq!(inactive, Err(ListingError::Inactive("410".to_string())));
}

#[test]
fn test_partner_names_are_validated() {
    let default = StubProvider::new("beenest", instant(vec![]));

    let bad_name = ListingAggregator::new(
        default.clone(),
        vec![PartnerProvider::new("a:b", StubProvider::new("a", Behavior::Fail))],
    );
    assert!(matches!(bad_name, Err(ListingError::InvalidInput(_))));

    let duplicate = ListingAggregator::new(
        default,
        vec![
            PartnerProvider::new("vrbo", StubProvider::new("vrbo", Behavior::Fail)),
            PartnerProvider::new("vrbo", StubProvider::new("vrbo", Behavior::Fail)),
        ],
    );
    assert!(matches!(duplicate, Err(ListingError::InvalidInput(_))));
}
