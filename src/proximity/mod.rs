//! Proximity matching: great-circle distances and provider ranking.

pub mod distance;
pub mod matcher;

pub use distance::{distance_label, haversine_km, EARTH_RADIUS_KM};
pub use matcher::{Candidate, NearbyArea, ProximityMatcher, RankedProvider, SortKey};
