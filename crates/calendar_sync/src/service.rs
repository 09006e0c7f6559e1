use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use crate::{
    CalendarError, CalendarFeed, CalendarStore, CalendarSyncConfig, DateRange, FeedFetcher,
    ICalParser, ListingLocks, ReservationBlock,
};

/// Manages listing feeds and rewrites reservation blocks from them
#[derive(Clone)]
pub struct CalendarSyncService {
    store: Arc<dyn CalendarStore>,
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn ICalParser>,
    locks: ListingLocks,
    config: CalendarSyncConfig,
}

impl CalendarSyncService {
    /// Creates a new calendar sync service
    pub fn new(
        store: Arc<dyn CalendarStore>,
        fetcher: Arc<dyn FeedFetcher>,
        parser: Arc<dyn ICalParser>,
        config: Option<CalendarSyncConfig>,
    ) -> Self {
        Self {
            store,
            fetcher,
            parser,
            locks: ListingLocks::new(),
            config: config.unwrap_or_default(),
        }
    }

    /// The service configuration
    pub fn config(&self) -> &CalendarSyncConfig {
        &self.config
    }

    /// Feeds registered for a listing
    pub async fn get_feeds(&self, listing_id: i64) -> Result<Vec<CalendarFeed>, CalendarError> {
        self.store.find_feeds(Some(listing_id)).await
    }

    /// Reservation blocks currently stored for a listing
    pub async fn get_blocks(&self, listing_id: i64) -> Result<Vec<ReservationBlock>, CalendarError> {
        self.store.find_blocks(listing_id).await
    }

    /// Replaces the feed set of a listing and refreshes it.
    ///
    /// Every URL is validated before anything is written, so a rejected
    /// submission leaves the previous feeds in place. Repeated URLs are
    /// registered once. An empty list clears all feeds.
    pub async fn set_feeds(
        &self,
        listing_id: i64,
        ical_urls: Vec<String>,
    ) -> Result<Vec<CalendarFeed>, CalendarError> {
        validate_feed_urls(&ical_urls)?;
        let ical_urls = dedup_urls(ical_urls);

        let _guard = self.locks.lock(listing_id).await;

        let feeds = self.store.replace_feeds(listing_id, &ical_urls).await?;
        info!("Listing {} now has {} calendar feeds", listing_id, feeds.len());

        self.refresh_feeds(&feeds, false).await;

        Ok(feeds)
    }

    /// Re-downloads feeds and replaces their reservation blocks.
    ///
    /// With `listing_id` only that listing's feeds are refreshed, otherwise every
    /// feed in the system. Returns one entry per feed in feed order; a feed that
    /// could not be fetched or parsed yields an empty entry and has its previous
    /// blocks removed. Only failing to load the feed list is an error.
    pub async fn refresh(
        &self,
        listing_id: Option<i64>,
    ) -> Result<Vec<Vec<ReservationBlock>>, CalendarError> {
        match listing_id {
            Some(id) => {
                let _guard = self.locks.lock(id).await;
                let feeds = self.store.find_feeds(Some(id)).await?;
                Ok(self.refresh_feeds(&feeds, false).await)
            }
            None => {
                let feeds = self.store.find_feeds(None).await?;
                Ok(self.refresh_feeds(&feeds, true).await)
            }
        }
    }

    /// Processes feeds in sequential batches of `batch_size`, concurrently
    /// within a batch. `join_all` keeps results in input order.
    async fn refresh_feeds(
        &self,
        feeds: &[CalendarFeed],
        lock_per_feed: bool,
    ) -> Vec<Vec<ReservationBlock>> {
        let batch_size = self.config.batch_size.max(1);
        let mut results = Vec::with_capacity(feeds.len());

        for (index, batch) in feeds.chunks(batch_size).enumerate() {
            debug!("Refreshing calendar batch {} ({} feeds)", index + 1, batch.len());

            let batch_results = join_all(
                batch
                    .iter()
                    .map(|feed| self.refresh_feed(feed, lock_per_feed)),
            )
            .await;

            results.extend(batch_results);
        }

        info!(
            "Refreshed {} calendar feeds in {} batches",
            feeds.len(),
            feeds.len().div_ceil(batch_size)
        );

        results
    }

    async fn refresh_feed(&self, feed: &CalendarFeed, take_lock: bool) -> Vec<ReservationBlock> {
        let ranges = match self.fetch_ranges(&feed.ical_url).await {
            Ok(ranges) => ranges,
            Err(e) => {
                warn!(
                    "Calendar {} of listing {} failed, clearing its blocks: {}",
                    feed.ical_url, feed.listing_id, e
                );
                Vec::new()
            }
        };

        let _guard = if take_lock {
            let guard = self.locks.lock(feed.listing_id).await;
            // The feed list was read before fetching; it may have been replaced since
            match self.store.find_feeds(Some(feed.listing_id)).await {
                Ok(current) if current.iter().any(|f| f.id == feed.id) => {}
                Ok(_) => {
                    debug!(
                        "Calendar {} of listing {} was removed during refresh",
                        feed.ical_url, feed.listing_id
                    );
                    return Vec::new();
                }
                Err(e) => {
                    error!(
                        "Failed to reload feeds of listing {}: {}",
                        feed.listing_id, e
                    );
                    return Vec::new();
                }
            }
            Some(guard)
        } else {
            None
        };

        match self
            .store
            .replace_blocks(feed.listing_id, &feed.ical_url, &ranges)
            .await
        {
            Ok(blocks) => blocks,
            Err(e) => {
                error!(
                    "Failed to store blocks of {} for listing {}: {}",
                    feed.ical_url, feed.listing_id, e
                );
                Vec::new()
            }
        }
    }

    async fn fetch_ranges(&self, url: &str) -> Result<Vec<DateRange>, CalendarError> {
        let raw = self.fetcher.fetch(url).await?;
        self.parser.parse(&raw)
    }
}

/// Drops repeated URLs, keeping the first occurrence
fn dedup_urls(ical_urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ical_urls
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Checks every URL uses http or https
pub fn validate_feed_urls(ical_urls: &[String]) -> Result<(), CalendarError> {
    match ical_urls
        .iter()
        .find(|url| !(url.starts_with("http://") || url.starts_with("https://")))
    {
        Some(url) => Err(CalendarError::Validation(format!(
            "Calendar URL must start with http:// or https://: {}",
            url
        ))),
        None => Ok(()),
    }
}
