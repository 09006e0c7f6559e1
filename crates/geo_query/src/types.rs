use serde::{Deserialize, Serialize};

/// Unit a search radius is expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Measurement {
    /// Kilometers
    #[default]
    Km,
    /// Miles
    Mi,
}

/// Point and radius as submitted by a client; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: Option<f64>,
    /// Longitude in degrees
    pub lng: Option<f64>,
    /// Search radius, in `measurement` units
    pub radius: Option<f64>,
    /// Unit of `radius`
    pub measurement: Option<Measurement>,
}

impl Coordinates {
    /// Returns the point when both latitude and longitude are usable numbers
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(GeoPoint { lat, lng })
            }
            _ => None,
        }
    }
}

/// Bounding rectangle as submitted by a client; every side may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern latitude
    pub north: Option<f64>,
    /// Southern latitude
    pub south: Option<f64>,
    /// Eastern longitude
    pub east: Option<f64>,
    /// Western longitude
    pub west: Option<f64>,
}

impl Bounds {
    /// Returns the rectangle when all four sides are usable numbers
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let sides = [self.north, self.south, self.east, self.west];
        if sides.iter().all(|side| side.is_some_and(f64::is_finite)) {
            Some(BoundingBox {
                north: self.north?,
                south: self.south?,
                east: self.east?,
                west: self.west?,
            })
        } else {
            None
        }
    }
}

/// A resolved latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// A fully specified bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Northern latitude
    pub north: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Western longitude
    pub west: f64,
}

/// Inclusive latitude and longitude intervals used as a range query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngRange {
    /// Lower latitude bound
    pub lat_min: f64,
    /// Upper latitude bound
    pub lat_max: f64,
    /// Lower (western) longitude bound
    pub lng_min: f64,
    /// Upper (eastern) longitude bound
    pub lng_max: f64,
}

impl LatLngRange {
    /// Whether the point falls inside the range.
    ///
    /// A range whose western bound is greater than its eastern bound is taken
    /// to cross the antimeridian.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let lat_ok = point.lat >= self.lat_min && point.lat <= self.lat_max;
        let lng_ok = if self.lng_min <= self.lng_max {
            point.lng >= self.lng_min && point.lng <= self.lng_max
        } else {
            point.lng >= self.lng_min || point.lng <= self.lng_max
        };
        lat_ok && lng_ok
    }
}

/// The location part of a listing search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    /// Point and radius
    pub coordinates: Option<Coordinates>,
    /// Explicit bounding rectangle
    pub bounds: Option<Bounds>,
    /// Free-text location, geocoded when no usable point or bounds are given
    pub location_query: Option<String>,
}

/// Spatial constraint a listing store applies to its query
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialFilter {
    /// No spatial constraint at all
    None,
    /// Listings must lie inside the range
    Range(LatLngRange),
    /// Case-insensitive substring match against the listing's location text
    Text(String),
}

/// Outcome of resolving a [`LocationQuery`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    /// Filter to apply
    pub filter: SpatialFilter,
    /// Point results should be ordered by distance from, if any
    pub used_coordinates: Option<GeoPoint>,
}

impl ResolvedQuery {
    /// A query without any spatial constraint
    pub fn unfiltered() -> Self {
        Self {
            filter: SpatialFilter::None,
            used_coordinates: None,
        }
    }
}

/// Errors raised by geocoding collaborators
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The request could not be sent or timed out
    #[error("Geocoding request failed: {0}")]
    Request(String),

    /// The service answered with something we could not use
    #[error("Invalid geocoding response: {0}")]
    Response(String),
}
