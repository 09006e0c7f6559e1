use async_trait::async_trait;
use calendar_sync::{CalendarError, CalendarFeed, CalendarStore, DateRange, ReservationBlock};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// [`CalendarStore`] backed by the `calendar_feeds` and `reservation_blocks` tables.
///
/// Feed and block replacements each run in a single transaction.
pub struct PgCalendarStore {
    pool: PgPool,
}

impl PgCalendarStore {
    /// Creates a store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(e: sqlx::Error) -> CalendarError {
    CalendarError::Storage(format!("Database error: {}", e))
}

fn feed_from_row(row: &PgRow) -> CalendarFeed {
    CalendarFeed {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        ical_url: row.get("ical_url"),
    }
}

fn block_from_row(row: &PgRow) -> ReservationBlock {
    ReservationBlock {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        source_url: row.get("source_url"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
    }
}

#[async_trait]
impl CalendarStore for PgCalendarStore {
    async fn find_feeds(
        &self,
        listing_id: Option<i64>,
    ) -> Result<Vec<CalendarFeed>, CalendarError> {
        let rows = sqlx::query(
            r#"
            SELECT id, listing_id, ical_url
            FROM calendar_feeds
            WHERE $1::BIGINT IS NULL OR listing_id = $1
            ORDER BY seq
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.iter().map(feed_from_row).collect())
    }

    async fn replace_feeds(
        &self,
        listing_id: i64,
        ical_urls: &[String],
    ) -> Result<Vec<CalendarFeed>, CalendarError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM calendar_feeds WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query(
            "DELETE FROM reservation_blocks WHERE listing_id = $1 AND NOT (source_url = ANY($2))",
        )
        .bind(listing_id)
        .bind(ical_urls)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        let mut feeds = Vec::with_capacity(ical_urls.len());
        for url in ical_urls {
            let row = sqlx::query(
                r#"
                INSERT INTO calendar_feeds (id, listing_id, ical_url)
                VALUES ($1, $2, $3)
                RETURNING id, listing_id, ical_url
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(listing_id)
            .bind(url)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
            feeds.push(feed_from_row(&row));
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(feeds)
    }

    async fn replace_blocks(
        &self,
        listing_id: i64,
        source_url: &str,
        ranges: &[DateRange],
    ) -> Result<Vec<ReservationBlock>, CalendarError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM reservation_blocks WHERE listing_id = $1 AND source_url = $2")
            .bind(listing_id)
            .bind(source_url)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let mut blocks = Vec::with_capacity(ranges.len());
        for range in ranges {
            let row = sqlx::query(
                r#"
                INSERT INTO reservation_blocks (id, listing_id, source_url, start_date, end_date)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, listing_id, source_url, start_date, end_date
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(listing_id)
            .bind(source_url)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
            blocks.push(block_from_row(&row));
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(blocks)
    }

    async fn find_blocks(&self, listing_id: i64) -> Result<Vec<ReservationBlock>, CalendarError> {
        let rows = sqlx::query(
            r#"
            SELECT id, listing_id, source_url, start_date, end_date
            FROM reservation_blocks
            WHERE listing_id = $1
            ORDER BY start_date
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.iter().map(block_from_row).collect())
    }

    async fn find_overlapping_blocks(
        &self,
        listing_ids: &[i64],
        window: DateRange,
    ) -> Result<Vec<ReservationBlock>, CalendarError> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, listing_id, source_url, start_date, end_date
            FROM reservation_blocks
            WHERE listing_id = ANY($1)
              AND start_date < $3
              AND end_date > $2
            "#,
        )
        .bind(listing_ids)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.iter().map(block_from_row).collect())
    }
}
