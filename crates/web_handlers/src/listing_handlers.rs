use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use crate::{ApiError, AppState, LookupParams, SearchListingsResponse, SearchParams};

/// Searches every provider; partner failures only shrink the result
pub async fn search_listings(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    params
        .validate()
        .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

    let query = params.into_inner().into_query();
    let listings = state.aggregator.search_listings(&query).await?;

    log::debug!("Search returned {} listings", listings.len());

    Ok(HttpResponse::Ok().json(SearchListingsResponse {
        total: listings.len(),
        listings,
    }))
}

/// Gets a listing by id, whether or not it is still active
pub async fn get_listing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LookupParams>,
) -> Result<HttpResponse, ApiError> {
    let listing_ref = state.aggregator.parse_ref(&path.into_inner());
    let listing = state
        .aggregator
        .get_listing_by_id(&listing_ref, params.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(listing))
}

/// Gets a bookable listing: 404 when missing, 410 when deactivated
pub async fn get_active_listing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LookupParams>,
) -> Result<HttpResponse, ApiError> {
    let listing_ref = state.aggregator.parse_ref(&path.into_inner());
    let listing = state
        .aggregator
        .find_active_listing(&listing_ref, params.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(listing))
}
