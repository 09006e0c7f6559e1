use actix_web::{HttpResponse, Result, web};
use calendar_sync::RefreshSummary;
use listing_search::{ListingRef, LookupOptions, ProviderNamespace};
use validator::Validate;

use crate::{ApiError, AppState, CalendarFeedsResponse, RefreshParams, UpdateCalendarsRequest};

/// Resolves the path id to an existing in-house listing
async fn in_house_listing(state: &AppState, raw_id: &str) -> Result<i64, ApiError> {
    let listing_ref: ListingRef = state.aggregator.parse_ref(raw_id);
    if listing_ref.namespace != ProviderNamespace::Default {
        return Err(ApiError::Validation(format!(
            "Calendars can only be managed for in-house listings: {}",
            raw_id
        )));
    }

    // Fails with 400 for malformed ids and 404 for unknown ones
    let listing = state
        .aggregator
        .get_listing_by_id(&listing_ref, LookupOptions::default())
        .await?;

    listing
        .id
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Invalid listing id: {}", raw_id)))
}

/// Lists the calendar feeds of an in-house listing
pub async fn get_listing_calendars(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let listing_id = in_house_listing(&state, &path.into_inner()).await?;
    let feeds = state.calendars.get_feeds(listing_id).await?;

    Ok(HttpResponse::Ok().json(CalendarFeedsResponse { listing_id, feeds }))
}

/// Replaces the calendar feeds of an in-house listing and syncs them
pub async fn set_listing_calendars(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<UpdateCalendarsRequest>,
) -> Result<HttpResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

    let listing_id = in_house_listing(&state, &path.into_inner()).await?;
    let request = request.into_inner();
    let feeds = state
        .calendars
        .set_feeds(listing_id, request.ical_urls)
        .await?;

    Ok(HttpResponse::Ok().json(CalendarFeedsResponse { listing_id, feeds }))
}

/// Re-syncs all feeds, or a single listing's
pub async fn refresh_calendars(
    state: web::Data<AppState>,
    params: web::Query<RefreshParams>,
) -> Result<HttpResponse, ApiError> {
    let results = state.calendars.refresh(params.listing_id).await?;
    let summary = RefreshSummary::from_results(&results);

    log::info!(
        "Manual calendar refresh: {} feeds, {} blocks",
        summary.feeds,
        summary.blocks
    );

    Ok(HttpResponse::Ok().json(summary))
}
