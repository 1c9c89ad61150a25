//! Proximity matcher: distance annotation, radius filtering and ranking.
//!
//! Ranking order: located candidates before unlocated ones, then the active
//! [`SortKey`], then lower distance, higher rating and finally provider id.
//! The last key is unique per provider, so the order is total.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::distance::{distance_label, haversine_km, round_km};
use crate::error::EngineError;
use crate::locality::{GeoPoint, LocalityRecord, LocalityRegistry};

/// Primary ordering for a ranking call.
/// Serialized with the same spelling [`fmt::Display`] prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "distance")]
    Distance,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "price-low")]
    PriceAscending,
    #[serde(rename = "price-high")]
    PriceDescending,
    #[serde(rename = "experience")]
    Experience,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::Rating => write!(f, "rating"),
            Self::PriceAscending => write!(f, "price-low"),
            Self::PriceDescending => write!(f, "price-high"),
            Self::Experience => write!(f, "experience"),
        }
    }
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" | "nearest" => Ok(Self::Distance),
            "rating" => Ok(Self::Rating),
            "price-low" | "price_ascending" | "price-asc" => Ok(Self::PriceAscending),
            "price-high" | "price_descending" | "price-desc" => Ok(Self::PriceDescending),
            "experience" => Ok(Self::Experience),
            _ => Err(EngineError::UnknownSortKey(s.to_string())),
        }
    }
}

/// A provider supplied by the caller for one ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub provider_id: String,
    /// Free-text city name or pincode, used when coordinates are unset.
    #[serde(default)]
    pub city_or_code: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub experience_years: Option<f64>,
}

impl Candidate {
    pub fn new(provider_id: impl Into<String>, city_or_code: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            city_or_code: city_or_code.into(),
            latitude: None,
            longitude: None,
            rating: None,
            price: None,
            experience_years: None,
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_experience(mut self, years: f64) -> Self {
        self.experience_years = Some(years);
        self
    }
}

/// One entry of a ranking result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProvider {
    pub provider_id: String,
    /// `None` when the distance could not be determined.
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub distance_label: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub experience_years: Option<f64>,
}

/// A registry city within reach of a reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyArea {
    pub city: String,
    pub district: String,
    pub region: String,
    pub distance_km: f64,
}

/// Reject radii that are negative, NaN or infinite.
pub fn check_radius(radius_km: f64) -> Result<f64, EngineError> {
    if radius_km.is_finite() && radius_km >= 0.0 {
        Ok(radius_km)
    } else {
        Err(EngineError::InvalidRadius(radius_km))
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Present values first, smallest first.
fn cmp_asc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Present values first, largest first.
fn cmp_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &RankedProvider, b: &RankedProvider, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Distance => cmp_asc(a.distance_km, b.distance_km),
        SortKey::Rating => cmp_desc(a.rating, b.rating),
        SortKey::PriceAscending => cmp_asc(a.price, b.price),
        SortKey::PriceDescending => cmp_desc(a.price, b.price),
        SortKey::Experience => cmp_desc(a.experience_years, b.experience_years),
    };
    a.distance_km
        .is_none()
        .cmp(&b.distance_km.is_none())
        .then(primary)
        .then_with(|| cmp_asc(a.distance_km, b.distance_km))
        .then_with(|| cmp_desc(a.rating, b.rating))
        .then_with(|| a.provider_id.cmp(&b.provider_id))
}

/// Ranks candidate providers around a reference locality.
#[derive(Debug, Clone)]
pub struct ProximityMatcher {
    registry: Arc<LocalityRegistry>,
}

impl ProximityMatcher {
    pub fn new(registry: Arc<LocalityRegistry>) -> Self {
        Self { registry }
    }

    /// Coordinates of a candidate: explicit ones first, then the registry.
    fn locate(&self, candidate: &Candidate) -> Option<GeoPoint> {
        GeoPoint::from_parts(candidate.latitude, candidate.longitude)
            .or_else(|| self.registry.point_of(&candidate.city_or_code))
    }

    /// Annotate, filter and sort `candidates`.
    ///
    /// Candidates farther than `radius_km` are dropped. Candidates without a
    /// determinable distance are dropped for [`SortKey::Distance`] and kept
    /// at the end of the ranking otherwise.
    pub fn rank(
        &self,
        reference: &LocalityRecord,
        candidates: &[Candidate],
        sort: SortKey,
        radius_km: f64,
    ) -> Result<Vec<RankedProvider>, EngineError> {
        let radius_km = check_radius(radius_km)?;
        let origin = reference.point();

        let mut ranked: Vec<RankedProvider> = candidates
            .iter()
            .filter_map(|c| {
                let distance_km = origin
                    .zip(self.locate(c))
                    .map(|(from, to)| haversine_km(from, to));
                match distance_km {
                    Some(d) if d > radius_km => return None,
                    None if sort == SortKey::Distance => return None,
                    _ => {}
                }
                Some(RankedProvider {
                    provider_id: c.provider_id.clone(),
                    distance_km,
                    distance_label: distance_km.map(distance_label),
                    rating: finite(c.rating),
                    price: finite(c.price),
                    experience_years: finite(c.experience_years),
                })
            })
            .collect();

        ranked.sort_by(|a, b| compare(a, b, sort));
        Ok(ranked)
    }

    /// Distance in km between two city-or-code places, rounded to 0.1 km.
    pub fn distance_between(&self, a: &str, b: &str) -> Option<f64> {
        let from = self.registry.point_of(a)?;
        let to = self.registry.point_of(b)?;
        Some(round_km(haversine_km(from, to)))
    }

    /// Registry cities within `radius_km` of `place`, nearest first.
    /// Each city appears once, at its closest record.
    pub fn nearby_areas(&self, place: &str, radius_km: f64) -> Result<Vec<NearbyArea>, EngineError> {
        let radius_km = check_radius(radius_km)?;
        let Some(origin) = self.registry.point_of(place) else {
            return Ok(Vec::new());
        };

        let mut closest: HashMap<String, NearbyArea> = HashMap::new();
        for city in self.registry.city_list() {
            let Some(point) = city.point() else {
                continue;
            };
            let d = haversine_km(origin, point);
            if d > radius_km {
                continue;
            }
            let area = NearbyArea {
                city: city.name.clone(),
                district: city.district,
                region: city.region,
                distance_km: round_km(d),
            };
            closest
                .entry(city.name)
                .and_modify(|cur| {
                    if area.distance_km < cur.distance_km {
                        *cur = area.clone();
                    }
                })
                .or_insert(area);
        }

        let mut areas: Vec<NearbyArea> = closest.into_values().collect();
        areas.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.city.cmp(&b.city))
        });
        Ok(areas)
    }
}
