use crate::{BoundingBox, GeoPoint, LatLngRange, Measurement};

/// Kilometers covered by one degree of latitude
pub const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometers covered by one degree of longitude at the equator
pub const KM_PER_DEGREE_LNG: f64 = 111.320;

/// Miles in a thousand kilometers.
///
/// Legacy constant carried over from the first search implementation, kept so
/// that mile-based searches return the same boxes they always have.
pub const MILES_PER_THOUSAND_KM: f64 = 621.37;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Converts a radius to kilometers
pub fn radius_in_km(radius: f64, measurement: Measurement) -> f64 {
    match measurement {
        Measurement::Km => radius,
        Measurement::Mi => radius * 1000.0 / MILES_PER_THOUSAND_KM,
    }
}

/// Approximates the box around a point and radius.
///
/// Degrees per kilometer are taken at the point's latitude only, which is not
/// great-circle exact but good enough at city scale. The longitude half-width
/// widens with `|lat|`; once it reaches 180 degrees every longitude is in range.
/// Longitude bounds are wrapped into [-180, 180], so a box crossing the
/// antimeridian comes back with `lng_min > lng_max`.
pub fn point_to_range(lat: f64, lng: f64, radius: f64, measurement: Measurement) -> LatLngRange {
    let km = radius_in_km(radius, measurement);
    let lat_delta = km / KM_PER_DEGREE_LAT;
    let lng_delta = km / (KM_PER_DEGREE_LNG * lat.to_radians().cos().abs());

    let (lng_min, lng_max) = if lng_delta >= 180.0 {
        (-180.0, 180.0)
    } else {
        (wrap_lng(lng - lng_delta), wrap_lng(lng + lng_delta))
    };

    LatLngRange {
        lat_min: lat - lat_delta,
        lat_max: lat + lat_delta,
        lng_min,
        lng_max,
    }
}

fn wrap_lng(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// Uses an explicit rectangle as the range, unchanged
pub fn bounds_to_range(bounds: &BoundingBox) -> LatLngRange {
    LatLngRange {
        lat_min: bounds.south,
        lat_max: bounds.north,
        lng_min: bounds.west,
        lng_max: bounds.east,
    }
}

/// Great-circle distance in kilometers (haversine)
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
