use async_trait::async_trait;
use geo_query::SpatialFilter;
use listing_search::{ListingError, ListingFilter, ListingRecord, ListingStore};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

const LISTING_COLUMNS: &str = "id, title, description, address, lat, lng, max_guests, \
     minimum_nights, price_per_night, currency, is_active";

/// [`ListingStore`] backed by the `listings` table
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    /// Creates a store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn internal_error(e: sqlx::Error) -> ListingError {
    ListingError::Internal(format!("Database error: {}", e))
}

fn listing_from_row(row: &PgRow) -> ListingRecord {
    ListingRecord {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        address: row.get("address"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        max_guests: row.get("max_guests"),
        minimum_nights: row.get("minimum_nights"),
        price_per_night: row.get("price_per_night"),
        currency: row.get("currency"),
        is_active: row.get("is_active"),
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn find_listings(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingRecord>, ListingError> {
        let (range, text) = match &filter.spatial {
            SpatialFilter::None => (None, None),
            SpatialFilter::Range(range) => (Some(*range), None),
            SpatialFilter::Text(text) => (None, Some(text.as_str())),
        };

        // A western bound east of the eastern one wraps the antimeridian
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE is_active = TRUE
              AND max_guests >= $1
              AND ($2::BIGINT IS NULL OR minimum_nights <= $2)
              AND ($3::DOUBLE PRECISION IS NULL OR (
                    lat BETWEEN $3 AND $4::DOUBLE PRECISION
                    AND CASE WHEN $5::DOUBLE PRECISION <= $6::DOUBLE PRECISION
                        THEN lng BETWEEN $5 AND $6
                        ELSE lng >= $5 OR lng <= $6
                    END))
              AND ($7::TEXT IS NULL
                   OR POSITION(LOWER($7) IN LOWER(COALESCE(address, ''))) > 0)
            ORDER BY id
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filter.min_guests)
            .bind(filter.stay_nights)
            .bind(range.map(|r| r.lat_min))
            .bind(range.map(|r| r.lat_max))
            .bind(range.map(|r| r.lng_min))
            .bind(range.map(|r| r.lng_max))
            .bind(text)
            .fetch_all(&self.pool)
            .await
            .map_err(internal_error)?;

        debug!("Listing query returned {} rows", rows.len());

        Ok(rows.iter().map(listing_from_row).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ListingRecord>, ListingError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal_error)?;

        Ok(row.as_ref().map(listing_from_row))
    }
}
