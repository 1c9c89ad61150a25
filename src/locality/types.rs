//! Core types for the locality subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate;

/// A validated six-digit pincode.
///
/// Only constructed through [`PostalCode::parse`], so every value held by the
/// engine already satisfies the format check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Trim and validate raw input. Returns `None` for anything that is not
    /// exactly six ASCII digits with a non-zero leading digit.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if validate::validate(trimmed) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid pincode '{}'", value))
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point from optional parts. Missing or non-finite values yield `None`.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Self { lat, lon }),
            _ => None,
        }
    }
}

/// One entry of the locality registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityRecord {
    pub code: PostalCode,
    pub city_name: String,
    pub district_name: String,
    pub region_name: String,
    pub state_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocalityRecord {
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    /// "City, District, State"
    pub fn display_line(&self) -> String {
        format!("{}, {}, {}", self.city_name, self.district_name, self.state_name)
    }
}

/// Coarse service availability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityTier {
    Unavailable,
    Partial,
    Full,
}

impl fmt::Display for AvailabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "unavailable"),
            Self::Partial => write!(f, "partial"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Why a resolution ended the way it did.
///
/// The first three map to [`AvailabilityTier::Unavailable`]; they are kept
/// apart so callers can tell "fix your input" from "not covered yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    InvalidFormat,
    NotFound,
    OutOfRegion,
    Serviceable,
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid format"),
            Self::NotFound => write!(f, "not found"),
            Self::OutOfRegion => write!(f, "out of region"),
            Self::Serviceable => write!(f, "serviceable"),
        }
    }
}

/// Result of resolving a raw pincode. Always fully formed, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub tier: AvailabilityTier,
    pub outcome: ResolutionOutcome,
    pub locality: Option<LocalityRecord>,
    pub nearby_localities: Vec<String>,
    pub message: String,
}

impl AvailabilityResult {
    pub fn is_available(&self) -> bool {
        self.tier != AvailabilityTier::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code_trims() {
        let code = PostalCode::parse("  380001\n").unwrap();
        assert_eq!(code.as_str(), "380001");
    }

    #[test]
    fn test_postal_code_rejects_bad_input() {
        assert!(PostalCode::parse("038000").is_none());
        assert!(PostalCode::parse("38000").is_none());
        assert!(PostalCode::parse("").is_none());
    }

    #[test]
    fn test_postal_code_serde() {
        let code: PostalCode = serde_json::from_str("\"395001\"").unwrap();
        assert_eq!(code.to_string(), "395001");
        assert!(serde_json::from_str::<PostalCode>("\"12345\"").is_err());
    }

    #[test]
    fn test_geo_point_requires_both_parts() {
        assert!(GeoPoint::from_parts(Some(23.0), None).is_none());
        assert!(GeoPoint::from_parts(Some(f64::NAN), Some(72.0)).is_none());
        assert_eq!(
            GeoPoint::from_parts(Some(23.0), Some(72.5)),
            Some(GeoPoint { lat: 23.0, lon: 72.5 })
        );
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AvailabilityTier::Full).unwrap(), "\"full\"");
        assert_eq!(
            serde_json::to_string(&ResolutionOutcome::OutOfRegion).unwrap(),
            "\"out_of_region\""
        );
    }
}
