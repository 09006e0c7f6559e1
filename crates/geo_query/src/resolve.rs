use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Geocoder, LocationQuery, Measurement, ResolvedQuery, SpatialFilter, bounds_to_range,
    point_to_range,
};

/// Configuration for query resolution
#[derive(Debug, Clone)]
pub struct GeoQueryConfig {
    /// Radius used when coordinates come without one (default: 25)
    pub default_radius: f64,
    /// Unit used when coordinates come without one (default: KM)
    pub default_measurement: Measurement,
}

impl Default for GeoQueryConfig {
    fn default() -> Self {
        Self {
            default_radius: 25.0,
            default_measurement: Measurement::Km,
        }
    }
}

/// Resolves the location part of a search into a [`SpatialFilter`]
#[derive(Clone)]
pub struct GeoQuery {
    geocoder: Arc<dyn Geocoder>,
    config: GeoQueryConfig,
}

impl GeoQuery {
    /// Creates a resolver backed by the given geocoder
    pub fn new(geocoder: Arc<dyn Geocoder>, config: GeoQueryConfig) -> Self {
        Self { geocoder, config }
    }

    /// Resolves a location query.
    ///
    /// Precedence: explicit bounds, then explicit coordinates, then the geocoded
    /// `location_query`, then a plain text match on `location_query`. Bounds win
    /// over a point range, but a valid point is still reported so results can be
    /// ordered by distance. Geocoder failures are logged and never returned.
    pub async fn resolve(&self, query: &LocationQuery) -> ResolvedQuery {
        let point = query.coordinates.as_ref().and_then(|c| c.point());
        let bounds = query.bounds.as_ref().and_then(|b| b.bounding_box());

        if let Some(bounds) = bounds {
            return ResolvedQuery {
                filter: SpatialFilter::Range(bounds_to_range(&bounds)),
                used_coordinates: point,
            };
        }

        if let (Some(point), Some(coordinates)) = (point, query.coordinates.as_ref()) {
            let radius = coordinates
                .radius
                .filter(|r| r.is_finite() && *r >= 0.0)
                .unwrap_or(self.config.default_radius);
            let measurement = coordinates
                .measurement
                .unwrap_or(self.config.default_measurement);

            return ResolvedQuery {
                filter: SpatialFilter::Range(point_to_range(
                    point.lat,
                    point.lng,
                    radius,
                    measurement,
                )),
                used_coordinates: Some(point),
            };
        }

        let Some(text) = query
            .location_query
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return ResolvedQuery::unfiltered();
        };

        match self.geocoder.geocode(text).await {
            Ok(Some(hit)) => {
                debug!(
                    "Resolved '{}' to ({}, {})",
                    text, hit.coordinates.lat, hit.coordinates.lng
                );
                let range = match hit.bounds {
                    Some(bounds) => bounds_to_range(&bounds),
                    None => point_to_range(
                        hit.coordinates.lat,
                        hit.coordinates.lng,
                        self.config.default_radius,
                        self.config.default_measurement,
                    ),
                };
                ResolvedQuery {
                    filter: SpatialFilter::Range(range),
                    used_coordinates: Some(hit.coordinates),
                }
            }
            Ok(None) => {
                debug!("No geocoding result for '{}', matching on text", text);
                ResolvedQuery {
                    filter: SpatialFilter::Text(text.to_string()),
                    used_coordinates: None,
                }
            }
            Err(e) => {
                warn!("Geocoding '{}' failed, matching on text: {}", text, e);
                ResolvedQuery {
                    filter: SpatialFilter::Text(text.to_string()),
                    used_coordinates: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{BoundingBox, Bounds, Coordinates, GeoError, GeoPoint, GeocodeHit};

    struct StubGeocoder {
        hit: Option<GeocodeHit>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubGeocoder {
        fn returning(hit: Option<GeocodeHit>) -> Arc<Self> {
            Arc::new(Self {
                hit,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                hit: None,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<GeocodeHit>, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeoError::Request("connection refused".to_string()));
            }
            Ok(self.hit.clone())
        }
    }

    fn minneapolis_coordinates() -> Coordinates {
        Coordinates {
            lat: Some(44.98),
            lng: Some(-93.27),
            radius: Some(5.0),
            measurement: Some(Measurement::Km),
        }
    }

    fn metro_bounds() -> Bounds {
        Bounds {
            north: Some(45.2),
            south: Some(44.7),
            east: Some(-92.9),
            west: Some(-93.6),
        }
    }

    #[tokio::test]
    async fn test_bounds_win_over_coordinates() {
        let geocoder = StubGeocoder::returning(None);
        let geo = GeoQuery::new(geocoder.clone(), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                coordinates: Some(minneapolis_coordinates()),
                bounds: Some(metro_bounds()),
                location_query: Some("Minneapolis".to_string()),
            })
            .await;

        let expected = bounds_to_range(&metro_bounds().bounding_box().unwrap());
        assert_eq!(resolved.filter, SpatialFilter::Range(expected));
        assert_eq!(
            resolved.used_coordinates,
            Some(GeoPoint { lat: 44.98, lng: -93.27 })
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_coordinates_without_bounds_use_point_range() {
        let geo = GeoQuery::new(StubGeocoder::returning(None), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                coordinates: Some(minneapolis_coordinates()),
                bounds: Some(Bounds {
                    north: Some(45.0),
                    ..Bounds::default()
                }),
                location_query: None,
            })
            .await;

        assert_eq!(
            resolved.filter,
            SpatialFilter::Range(point_to_range(44.98, -93.27, 5.0, Measurement::Km))
        );
    }

    #[tokio::test]
    async fn test_missing_radius_uses_default() {
        let geo = GeoQuery::new(StubGeocoder::returning(None), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                coordinates: Some(Coordinates {
                    lat: Some(10.0),
                    lng: Some(10.0),
                    radius: None,
                    measurement: None,
                }),
                ..LocationQuery::default()
            })
            .await;

        assert_eq!(
            resolved.filter,
            SpatialFilter::Range(point_to_range(10.0, 10.0, 25.0, Measurement::Km))
        );
    }

    #[tokio::test]
    async fn test_geocoded_location_uses_returned_bounds() {
        let bounds = BoundingBox {
            north: 45.05,
            south: 44.89,
            east: -93.19,
            west: -93.33,
        };
        let geo = GeoQuery::new(
            StubGeocoder::returning(Some(GeocodeHit {
                coordinates: GeoPoint { lat: 44.97, lng: -93.26 },
                bounds: Some(bounds),
                display_name: None,
            })),
            GeoQueryConfig::default(),
        );

        let resolved = geo
            .resolve(&LocationQuery {
                coordinates: Some(Coordinates {
                    lat: Some(f64::NAN),
                    ..Coordinates::default()
                }),
                location_query: Some("Minneapolis, MN".to_string()),
                ..LocationQuery::default()
            })
            .await;

        assert_eq!(resolved.filter, SpatialFilter::Range(bounds_to_range(&bounds)));
        assert_eq!(
            resolved.used_coordinates,
            Some(GeoPoint { lat: 44.97, lng: -93.26 })
        );
    }

    #[tokio::test]
    async fn test_empty_geocode_falls_back_to_text() {
        let geo = GeoQuery::new(StubGeocoder::returning(None), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                location_query: Some("  Nowhere Springs ".to_string()),
                ..LocationQuery::default()
            })
            .await;

        assert_eq!(
            resolved.filter,
            SpatialFilter::Text("Nowhere Springs".to_string())
        );
        assert!(resolved.used_coordinates.is_none());
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_swallowed() {
        let geocoder = StubGeocoder::failing();
        let geo = GeoQuery::new(geocoder.clone(), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                location_query: Some("Duluth".to_string()),
                ..LocationQuery::default()
            })
            .await;

        assert_eq!(resolved.filter, SpatialFilter::Text("Duluth".to_string()));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_usable_means_no_filter() {
        let geocoder = StubGeocoder::returning(None);
        let geo = GeoQuery::new(geocoder.clone(), GeoQueryConfig::default());

        let resolved = geo
            .resolve(&LocationQuery {
                location_query: Some("   ".to_string()),
                ..LocationQuery::default()
            })
            .await;

        assert_eq!(resolved, ResolvedQuery::unfiltered());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}
