//! Availability resolver: pincode → tier, locality and suggested cities.
//!
//! Flow: validate → exact registry lookup → state check → district tier →
//! adjacency suggestions. Every branch yields a complete result.

use std::sync::Arc;

use super::registry::LocalityRegistry;
use super::types::{AvailabilityResult, AvailabilityTier, LocalityRecord, PostalCode, ResolutionOutcome};

/// Classifies pincodes against the configured primary state and district.
#[derive(Debug, Clone)]
pub struct AvailabilityResolver {
    registry: Arc<LocalityRegistry>,
    primary_state: String,
    primary_district: String,
}

impl AvailabilityResolver {
    pub fn new(
        registry: Arc<LocalityRegistry>,
        primary_state: impl Into<String>,
        primary_district: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            primary_state: primary_state.into(),
            primary_district: primary_district.into(),
        }
    }

    pub fn registry(&self) -> &LocalityRegistry {
        &self.registry
    }

    pub fn primary_state(&self) -> &str {
        &self.primary_state
    }

    /// Resolve a raw, possibly padded pincode string.
    pub fn resolve(&self, raw: &str) -> AvailabilityResult {
        let Some(code) = PostalCode::parse(raw) else {
            return unavailable(
                ResolutionOutcome::InvalidFormat,
                None,
                "invalid format: please enter a 6-digit pincode that does not start with 0".into(),
            );
        };

        let Some(record) = self.registry.lookup(&code) else {
            return unavailable(
                ResolutionOutcome::NotFound,
                None,
                format!("not in coverage database: pincode {} is not recognised", code),
            );
        };

        if record.state_name != self.primary_state {
            let message = format!(
                "out of service region: {} is in {}; services are currently available only in {}",
                record.city_name, record.state_name, self.primary_state
            );
            return unavailable(ResolutionOutcome::OutOfRegion, Some(record.clone()), message);
        }

        let tier = if record.district_name == self.primary_district {
            AvailabilityTier::Full
        } else {
            AvailabilityTier::Partial
        };

        AvailabilityResult {
            tier,
            outcome: ResolutionOutcome::Serviceable,
            nearby_localities: self.nearby_for(record),
            message: format!(
                "Services available in your area - {}, {}",
                record.city_name, record.district_name
            ),
            locality: Some(record.clone()),
        }
    }

    /// Adjacency suggestions for a record's district, or just its own city.
    fn nearby_for(&self, record: &LocalityRecord) -> Vec<String> {
        match self.registry.adjacent_cities(&record.district_name) {
            Some(cities) => cities.to_vec(),
            None => vec![record.city_name.clone()],
        }
    }
}

fn unavailable(
    outcome: ResolutionOutcome,
    locality: Option<LocalityRecord>,
    message: String,
) -> AvailabilityResult {
    AvailabilityResult {
        tier: AvailabilityTier::Unavailable,
        outcome,
        locality,
        nearby_localities: Vec::new(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver() -> AvailabilityResolver {
        AvailabilityResolver::new(LocalityRegistry::builtin(), "Gujarat", "Ahmedabad")
    }

    #[test]
    fn test_primary_district_is_full() {
        let result = resolver().resolve("380001");
        assert_eq!(result.tier, AvailabilityTier::Full);
        assert_eq!(result.outcome, ResolutionOutcome::Serviceable);
        assert_eq!(result.locality.as_ref().unwrap().city_name, "Ahmedabad");
        assert_eq!(result.nearby_localities, vec!["Ahmedabad", "Gandhinagar", "Anand"]);
        assert!(result.is_available());
    }

    #[test]
    fn test_other_city_in_primary_district_is_full() {
        let result = resolver().resolve("382110");
        assert_eq!(result.tier, AvailabilityTier::Full);
        assert_eq!(result.locality.unwrap().city_name, "Gandhinagar");
    }

    #[test]
    fn test_secondary_district_is_partial() {
        let result = resolver().resolve(" 395001 ");
        assert_eq!(result.tier, AvailabilityTier::Partial);
        assert_eq!(result.nearby_localities, vec!["Surat", "Navsari", "Vapi"]);
        assert!(result.message.contains("Surat"));
    }

    #[test]
    fn test_invalid_format() {
        for raw in ["12345", "abcdef", "", "012345", "1234567"] {
            let result = resolver().resolve(raw);
            assert_eq!(result.tier, AvailabilityTier::Unavailable);
            assert_eq!(result.outcome, ResolutionOutcome::InvalidFormat);
            assert!(result.message.contains("invalid format"));
            assert!(result.locality.is_none());
            assert!(result.nearby_localities.is_empty());
        }
    }

    #[test]
    fn test_not_found() {
        let result = resolver().resolve("999999");
        assert_eq!(result.tier, AvailabilityTier::Unavailable);
        assert_eq!(result.outcome, ResolutionOutcome::NotFound);
        assert!(result.message.contains("not in coverage database"));
        assert!(result.locality.is_none());
    }

    #[test]
    fn test_out_of_region_keeps_locality() {
        let result = resolver().resolve("400001");
        assert_eq!(result.tier, AvailabilityTier::Unavailable);
        assert_eq!(result.outcome, ResolutionOutcome::OutOfRegion);
        let locality = result.locality.unwrap();
        assert_eq!(locality.city_name, "Mumbai");
        assert_eq!(locality.state_name, "Maharashtra");
        assert!(result.message.contains("Gujarat"));
        assert!(result.nearby_localities.is_empty());
    }

    #[test]
    fn test_missing_adjacency_falls_back_to_city() {
        let record = LocalityRecord {
            code: PostalCode::parse("560001").unwrap(),
            city_name: "Bengaluru".into(),
            district_name: "Bengaluru Urban".into(),
            region_name: "Bayaluseeme".into(),
            state_name: "Karnataka".into(),
            latitude: Some(12.97),
            longitude: Some(77.59),
        };
        let registry = Arc::new(LocalityRegistry::from_records(vec![record], HashMap::new()));
        let resolver = AvailabilityResolver::new(registry, "Karnataka", "Mysuru");
        let result = resolver.resolve("560001");
        assert_eq!(result.tier, AvailabilityTier::Partial);
        assert_eq!(result.nearby_localities, vec!["Bengaluru"]);
    }

    #[test]
    fn test_configured_primary_changes_tiers() {
        let resolver = AvailabilityResolver::new(LocalityRegistry::builtin(), "Maharashtra", "Pune");
        assert_eq!(resolver.resolve("411001").tier, AvailabilityTier::Full);
        assert_eq!(resolver.resolve("400001").tier, AvailabilityTier::Partial);
        assert_eq!(resolver.resolve("380001").outcome, ResolutionOutcome::OutOfRegion);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver();
        for code in ["380001", "395001", "999999", "400001", "x"] {
            assert_eq!(r.resolve(code), r.resolve(code));
        }
    }
}
