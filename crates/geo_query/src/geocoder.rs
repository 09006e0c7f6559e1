use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{BoundingBox, GeoError, GeoPoint};

/// A geocoded location
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    /// Representative point of the location
    pub coordinates: GeoPoint,
    /// Area covered by the location, when the service reports one
    pub bounds: Option<BoundingBox>,
    /// Human readable name returned by the service
    pub display_name: Option<String>,
}

/// Trait for services resolving free-text addresses to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `address`; `Ok(None)` means the service knows no such place
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeHit>, GeoError>;
}

/// Configuration for the Nominatim client
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the Nominatim instance
    pub base_url: String,
    /// User agent sent with every request, required by the public instance
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "BeenestListingSearch/1.0".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Geocoder backed by the OpenStreetMap Nominatim search API
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
    /// `[south, north, west, east]`
    boundingbox: Option<Vec<String>>,
}

impl NominatimGeocoder {
    /// Creates a new Nominatim client
    pub fn new(config: NominatimConfig) -> Result<Self, GeoError> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeoError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_place(place: NominatimPlace) -> Result<GeocodeHit, GeoError> {
        let lat = parse_degrees(&place.lat)?;
        let lng = parse_degrees(&place.lon)?;

        let bounds = match place.boundingbox.as_deref() {
            Some([south, north, west, east]) => Some(BoundingBox {
                north: parse_degrees(north)?,
                south: parse_degrees(south)?,
                east: parse_degrees(east)?,
                west: parse_degrees(west)?,
            }),
            _ => None,
        };

        Ok(GeocodeHit {
            coordinates: GeoPoint { lat, lng },
            bounds,
            display_name: place.display_name,
        })
    }
}

fn parse_degrees(raw: &str) -> Result<f64, GeoError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| GeoError::Response(format!("Invalid coordinate value: {}", raw)))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeHit>, GeoError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(address.trim())
        );

        debug!("Geocoding location: {}", address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeoError::Response(format!("HTTP {}", response.status())));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeoError::Response(format!("Failed to parse response: {}", e)))?;

        match places.into_iter().next() {
            Some(place) => Self::parse_place(place).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_with_bounding_box() {
        let place: NominatimPlace = serde_json::from_value(serde_json::json!({
            "lat": "44.9772995",
            "lon": "-93.2654692",
            "display_name": "Minneapolis, Hennepin County, Minnesota, United States",
            "boundingbox": ["44.8902099", "45.0511", "-93.3291", "-93.1938"]
        }))
        .unwrap();

        let hit = NominatimGeocoder::parse_place(place).unwrap();
        assert_eq!(hit.coordinates.lat, 44.9772995);
        assert_eq!(hit.coordinates.lng, -93.2654692);

        let bounds = hit.bounds.unwrap();
        assert_eq!(bounds.south, 44.8902099);
        assert_eq!(bounds.north, 45.0511);
        assert_eq!(bounds.west, -93.3291);
        assert_eq!(bounds.east, -93.1938);
    }

    #[test]
    fn test_parse_place_without_bounding_box() {
        let place: NominatimPlace = serde_json::from_value(serde_json::json!({
            "lat": "10.5",
            "lon": "20.25"
        }))
        .unwrap();

        let hit = NominatimGeocoder::parse_place(place).unwrap();
        assert_eq!(hit.coordinates, GeoPoint { lat: 10.5, lng: 20.25 });
        assert!(hit.bounds.is_none());
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        let place: NominatimPlace = serde_json::from_value(serde_json::json!({
            "lat": "north-ish",
            "lon": "20.25"
        }))
        .unwrap();

        assert!(matches!(
            NominatimGeocoder::parse_place(place),
            Err(GeoError::Response(_))
        ));
    }
}
