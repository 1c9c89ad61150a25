//! Great-circle distance on a spherical Earth.

use std::f64::consts::PI;

use crate::locality::GeoPoint;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat) * DEG;
    let d_lon = (b.lon - a.lon) * DEG;
    let h = (d_lat / 2.0).sin().powi(2)
        + (a.lat * DEG).cos() * (b.lat * DEG).cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round to one decimal place, as shown to users.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Coarse human-readable proximity bucket.
pub fn distance_label(km: f64) -> String {
    if km < 1.0 {
        "Near you".to_string()
    } else if km < 5.0 {
        "Within 5 km".to_string()
    } else if km < 10.0 {
        "Within 10 km".to_string()
    } else if km < 25.0 {
        "Within 25 km".to_string()
    } else {
        format!("{} km away", km.round())
    }
}
