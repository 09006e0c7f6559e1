use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{CalendarError, CalendarFeed, DateRange, ReservationBlock};

/// Trait for persistence of feeds and reservation blocks
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Feeds of one listing, or of every listing when `listing_id` is `None`,
    /// in a stable order
    async fn find_feeds(&self, listing_id: Option<i64>)
    -> Result<Vec<CalendarFeed>, CalendarError>;

    /// Replaces the feed set of a listing.
    ///
    /// Blocks parsed from URLs that are no longer registered are removed in the
    /// same operation.
    async fn replace_feeds(
        &self,
        listing_id: i64,
        ical_urls: &[String],
    ) -> Result<Vec<CalendarFeed>, CalendarError>;

    /// Atomically replaces every block of the `(listing_id, source_url)` pair
    async fn replace_blocks(
        &self,
        listing_id: i64,
        source_url: &str,
        ranges: &[DateRange],
    ) -> Result<Vec<ReservationBlock>, CalendarError>;

    /// All blocks of a listing ordered by start date
    async fn find_blocks(&self, listing_id: i64) -> Result<Vec<ReservationBlock>, CalendarError>;

    /// Blocks of the given listings overlapping `window`
    async fn find_overlapping_blocks(
        &self,
        listing_ids: &[i64],
        window: DateRange,
    ) -> Result<Vec<ReservationBlock>, CalendarError>;
}

#[derive(Default)]
struct CalendarTables {
    feeds: Vec<CalendarFeed>,
    blocks: Vec<ReservationBlock>,
}

/// In-memory [`CalendarStore`] for tests and local development
#[derive(Default)]
pub struct InMemoryCalendarStore {
    tables: RwLock<CalendarTables>,
}

impl InMemoryCalendarStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Every block currently stored, in insertion order
    pub async fn all_blocks(&self) -> Vec<ReservationBlock> {
        self.tables.read().await.blocks.clone()
    }
}

#[async_trait]
impl CalendarStore for InMemoryCalendarStore {
    async fn find_feeds(
        &self,
        listing_id: Option<i64>,
    ) -> Result<Vec<CalendarFeed>, CalendarError> {
        let tables = self.tables.read().await;
        Ok(tables
            .feeds
            .iter()
            .filter(|feed| listing_id.is_none_or(|id| feed.listing_id == id))
            .cloned()
            .collect())
    }

    async fn replace_feeds(
        &self,
        listing_id: i64,
        ical_urls: &[String],
    ) -> Result<Vec<CalendarFeed>, CalendarError> {
        let mut tables = self.tables.write().await;

        tables.feeds.retain(|feed| feed.listing_id != listing_id);
        let feeds: Vec<CalendarFeed> = ical_urls
            .iter()
            .map(|url| CalendarFeed {
                id: Uuid::new_v4(),
                listing_id,
                ical_url: url.clone(),
            })
            .collect();
        tables.feeds.extend(feeds.iter().cloned());

        let kept: HashSet<&str> = ical_urls.iter().map(String::as_str).collect();
        tables
            .blocks
            .retain(|block| block.listing_id != listing_id || kept.contains(block.source_url.as_str()));

        Ok(feeds)
    }

    async fn replace_blocks(
        &self,
        listing_id: i64,
        source_url: &str,
        ranges: &[DateRange],
    ) -> Result<Vec<ReservationBlock>, CalendarError> {
        let mut tables = self.tables.write().await;

        tables
            .blocks
            .retain(|block| !(block.listing_id == listing_id && block.source_url == source_url));
        let blocks: Vec<ReservationBlock> = ranges
            .iter()
            .map(|range| ReservationBlock {
                id: Uuid::new_v4(),
                listing_id,
                source_url: source_url.to_string(),
                start_date: range.start,
                end_date: range.end,
            })
            .collect();
        tables.blocks.extend(blocks.iter().cloned());

        Ok(blocks)
    }

    async fn find_blocks(&self, listing_id: i64) -> Result<Vec<ReservationBlock>, CalendarError> {
        let tables = self.tables.read().await;
        let mut blocks: Vec<ReservationBlock> = tables
            .blocks
            .iter()
            .filter(|block| block.listing_id == listing_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|block| block.start_date);
        Ok(blocks)
    }

    async fn find_overlapping_blocks(
        &self,
        listing_ids: &[i64],
        window: DateRange,
    ) -> Result<Vec<ReservationBlock>, CalendarError> {
        let tables = self.tables.read().await;
        Ok(tables
            .blocks
            .iter()
            .filter(|block| listing_ids.contains(&block.listing_id))
            .filter(|block| block.range().overlaps(&window))
            .cloned()
            .collect())
    }
}
