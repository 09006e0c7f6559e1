use calendar_sync::{CalendarError, CalendarFeed};
use chrono::NaiveDate;
use geo_query::{Bounds, Coordinates, LocationQuery, Measurement};
use listing_search::{Listing, ListingError, LookupOptions, SearchQuery};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string of `GET /api/listings/search`.
///
/// Numeric location fields are read leniently: a value that is not a finite
/// number counts as absent, so the search degrades to the next location source
/// instead of failing.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchParams {
    /// Latitude of the search center
    pub lat: Option<String>,
    /// Longitude of the search center
    pub lng: Option<String>,
    /// Search radius
    pub radius: Option<String>,
    /// Unit of `radius`, `KM` or `MI`
    #[validate(custom(function = "validate_measurement"))]
    pub measurement: Option<String>,
    /// Northern bound
    pub north: Option<String>,
    /// Southern bound
    pub south: Option<String>,
    /// Eastern bound
    pub east: Option<String>,
    /// Western bound
    pub west: Option<String>,
    /// Free-text location
    #[validate(length(max = 200, message = "Location query is too long"))]
    pub location_query: Option<String>,
    /// Arrival day
    pub check_in_date: Option<NaiveDate>,
    /// Departure day
    pub check_out_date: Option<NaiveDate>,
    /// Party size
    #[validate(range(min = 1, max = 100, message = "Number of guests must be between 1 and 100"))]
    pub number_of_guests: Option<u32>,
}

fn number(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn parse_measurement(raw: &str) -> Option<Measurement> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "KM" => Some(Measurement::Km),
        "MI" => Some(Measurement::Mi),
        _ => None,
    }
}

/// Custom validation function for radius units
fn validate_measurement(measurement: &str) -> Result<(), validator::ValidationError> {
    match parse_measurement(measurement) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("invalid_measurement")),
    }
}

impl SearchParams {
    /// Converts the query string into a provider search
    pub fn into_query(self) -> SearchQuery {
        let coordinates = (self.lat.is_some() || self.lng.is_some()).then(|| Coordinates {
            lat: number(&self.lat),
            lng: number(&self.lng),
            radius: number(&self.radius),
            measurement: self.measurement.as_deref().and_then(parse_measurement),
        });

        let any_bound = [&self.north, &self.south, &self.east, &self.west]
            .iter()
            .any(|side| side.is_some());
        let bounds = any_bound.then(|| Bounds {
            north: number(&self.north),
            south: number(&self.south),
            east: number(&self.east),
            west: number(&self.west),
        });

        SearchQuery {
            location: LocationQuery {
                coordinates,
                bounds,
                location_query: self.location_query,
            },
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            number_of_guests: self.number_of_guests,
        }
    }
}

/// Response of a listing search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListingsResponse {
    /// Matching listings, in-house first
    pub listings: Vec<Listing>,
    /// Number of listings returned
    pub total: usize,
}

/// Query string of single listing lookups
#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    /// Attach busy periods to the listing
    pub include_reservations: Option<bool>,
}

impl From<LookupParams> for LookupOptions {
    fn from(params: LookupParams) -> Self {
        LookupOptions {
            include_reservations: params.include_reservations.unwrap_or(false),
        }
    }
}

/// Request structure for replacing a listing's calendar feeds
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCalendarsRequest {
    /// iCal URLs; an empty list removes every feed
    #[validate(length(max = 20, message = "At most 20 calendars per listing"))]
    pub ical_urls: Vec<String>,
}

/// Calendar feeds of one listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarFeedsResponse {
    /// In-house listing id
    pub listing_id: i64,
    /// Registered feeds
    pub feeds: Vec<CalendarFeed>,
}

/// Query string of `POST /api/calendars/refresh`
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Only refresh this listing's feeds
    pub listing_id: Option<i64>,
}

/// Error returned by every handler
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Malformed request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Listing lookup or search failure
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Calendar management failure
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            ApiError::Validation(_)
            | ApiError::Listing(ListingError::InvalidInput(_))
            | ApiError::Calendar(CalendarError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Listing(ListingError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Listing(ListingError::Inactive(_)) => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        let (error, message) = match self {
            ApiError::Validation(msg) | ApiError::Calendar(CalendarError::Validation(msg)) => {
                ("validation_error", msg.clone())
            }
            ApiError::Listing(ListingError::InvalidInput(msg)) => ("invalid_input", msg.clone()),
            ApiError::Listing(ListingError::NotFound(id)) => {
                ("listing_not_found", format!("Listing {} not found", id))
            }
            ApiError::Listing(ListingError::Inactive(id)) => {
                ("listing_inactive", format!("Listing {} is no longer active", id))
            }
            _ => {
                log::error!("Request failed: {}", self);
                ("internal_error", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": error,
            "message": message
        }))
    }
}
