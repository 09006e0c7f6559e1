use actix_web::{HttpResponse, Result, web};

use crate::*;

/// Liveness probe
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().body("OK"))
}

/// Registers every route and the JSON error handlers for malformed input.
///
/// Expects a `web::Data<AppState>` on the enclosing app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(health))
    .service(
        web::scope("/api")
            .route("/listings/search", web::get().to(search_listings))
            .route("/listings/{id}", web::get().to(get_listing))
            .route("/listings/{id}/active", web::get().to(get_active_listing))
            .route(
                "/listings/{id}/calendars",
                web::get().to(get_listing_calendars),
            )
            .route(
                "/listings/{id}/calendars",
                web::put().to(set_listing_calendars),
            )
            .route("/calendars/refresh", web::post().to(refresh_calendars)),
    );
}
