//! The engine facade: resolver and matcher behind memoizing caches.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::locality::{AvailabilityResolver, AvailabilityResult, LocalityRecord, LocalityRegistry};
use crate::proximity::matcher::check_radius;
use crate::proximity::{Candidate, NearbyArea, ProximityMatcher, RankedProvider, SortKey};

/// Cache key for a ranking call. The digest covers the reference locality
/// and the candidate list, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RankKey {
    sort: SortKey,
    radius_bits: u64,
    digest: u64,
}

impl RankKey {
    fn new(reference: &LocalityRecord, candidates: &[Candidate], sort: SortKey, radius_km: f64) -> Self {
        let mut h = DefaultHasher::new();
        reference.code.hash(&mut h);
        bits(reference.latitude).hash(&mut h);
        bits(reference.longitude).hash(&mut h);
        candidates.len().hash(&mut h);
        for c in candidates {
            c.provider_id.hash(&mut h);
            c.city_or_code.hash(&mut h);
            bits(c.latitude).hash(&mut h);
            bits(c.longitude).hash(&mut h);
            bits(c.rating).hash(&mut h);
            bits(c.price).hash(&mut h);
            bits(c.experience_years).hash(&mut h);
        }
        Self {
            sort,
            radius_bits: radius_km.to_bits(),
            digest: h.finish(),
        }
    }
}

fn bits(v: Option<f64>) -> Option<u64> {
    v.map(f64::to_bits)
}

/// Availability plus the ranking computed around the resolved locality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PincodeRanking {
    pub availability: AvailabilityResult,
    pub providers: Vec<RankedProvider>,
}

/// Resolver and matcher with memoized entry points. Safe to share across
/// threads; the caches are the only mutable state.
#[derive(Debug)]
pub struct LocatorEngine {
    config: EngineConfig,
    resolver: AvailabilityResolver,
    matcher: ProximityMatcher,
    availability_cache: TtlCache<String, AvailabilityResult>,
    ranking_cache: TtlCache<RankKey, Vec<RankedProvider>>,
}

impl LocatorEngine {
    /// Engine over the built-in registry with the wall clock.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(config, LocalityRegistry::builtin(), Arc::new(SystemClock))
    }

    pub fn with_parts(config: EngineConfig, registry: Arc<LocalityRegistry>, clock: Arc<dyn Clock>) -> Self {
        let resolver = AvailabilityResolver::new(
            registry.clone(),
            config.primary_state.clone(),
            config.primary_district.clone(),
        );
        Self {
            resolver,
            matcher: ProximityMatcher::new(registry),
            availability_cache: TtlCache::with_clock(config.cache_ttl_ms, clock.clone()),
            ranking_cache: TtlCache::with_clock(config.cache_ttl_ms, clock),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LocalityRegistry {
        self.resolver.registry()
    }

    /// Memoized availability check, keyed by the trimmed input.
    pub fn check_availability(&self, raw: &str) -> AvailabilityResult {
        let key = raw.trim().to_string();
        let result = self
            .availability_cache
            .get_or_insert_with(key, || self.resolver.resolve(raw));
        debug!(tier = %result.tier, outcome = %result.outcome, "availability resolved");
        result
    }

    /// Memoized ranking. `radius_km` falls back to the configured default.
    pub fn rank(
        &self,
        reference: &LocalityRecord,
        candidates: &[Candidate],
        sort: SortKey,
        radius_km: Option<f64>,
    ) -> Result<Vec<RankedProvider>, EngineError> {
        let radius_km = check_radius(radius_km.unwrap_or(self.config.default_radius_km))?;
        let key = RankKey::new(reference, candidates, sort, radius_km);
        self.ranking_cache.try_get_or_insert_with(key, || {
            self.matcher.rank(reference, candidates, sort, radius_km)
        })
    }

    /// Resolve a pincode, then rank around it. The provider list is empty
    /// whenever the pincode is unavailable, including out-of-region codes
    /// that still carry a locality.
    pub fn rank_for_pincode(
        &self,
        raw: &str,
        candidates: &[Candidate],
        sort: SortKey,
        radius_km: Option<f64>,
    ) -> Result<PincodeRanking, EngineError> {
        let radius_km = check_radius(radius_km.unwrap_or(self.config.default_radius_km))?;
        let availability = self.check_availability(raw);
        let providers = match &availability.locality {
            Some(reference) if availability.is_available() => {
                self.rank(reference, candidates, sort, Some(radius_km))?
            }
            _ => Vec::new(),
        };
        Ok(PincodeRanking { availability, providers })
    }

    pub fn distance_between(&self, a: &str, b: &str) -> Option<f64> {
        self.matcher.distance_between(a, b)
    }

    pub fn nearby_areas(&self, place: &str, radius_km: Option<f64>) -> Result<Vec<NearbyArea>, EngineError> {
        self.matcher
            .nearby_areas(place, radius_km.unwrap_or(self.config.default_radius_km))
    }

    /// Drop every memoized result.
    pub fn clear_caches(&self) {
        self.availability_cache.clear();
        self.ranking_cache.clear();
    }

    /// Evict expired entries from both caches, returning how many went.
    pub fn purge_expired(&self) -> usize {
        self.availability_cache.purge_expired() + self.ranking_cache.purge_expired()
    }

    /// Number of memoized (availability, ranking) results currently held.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.availability_cache.len(), self.ranking_cache.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::locality::AvailabilityTier;

    fn engine() -> (LocatorEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let engine = LocatorEngine::with_parts(EngineConfig::default(), LocalityRegistry::builtin(), clock.clone());
        (engine, clock)
    }

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new("gnr-1", "Gandhinagar").with_rating(4.6),
            Candidate::new("amd-1", "380015").with_rating(4.2),
            Candidate::new("srt-1", "Surat").with_rating(5.0),
        ]
    }

    #[test]
    fn test_availability_is_memoized_by_trimmed_input() {
        let (engine, _clock) = engine();
        let a = engine.check_availability("380001");
        let b = engine.check_availability("  380001 ");
        assert_eq!(a, b);
        assert_eq!(engine.cache_sizes().0, 1);
    }

    #[test]
    fn test_availability_recomputes_after_ttl() {
        let (engine, clock) = engine();
        engine.check_availability("395001");
        clock.advance(EngineConfig::default().cache_ttl_ms as i64 + 1);
        assert_eq!(engine.purge_expired(), 1);
        assert_eq!(engine.cache_sizes(), (0, 0));
        assert_eq!(engine.check_availability("395001").tier, AvailabilityTier::Partial);
    }

    #[test]
    fn test_rank_uses_default_radius() {
        let (engine, _clock) = engine();
        let reference = engine.check_availability("380001").locality.unwrap();
        let ranked = engine.rank(&reference, &candidates(), SortKey::Distance, None).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["amd-1", "gnr-1"]);

        let wide = engine.rank(&reference, &candidates(), SortKey::Rating, Some(300.0)).unwrap();
        assert_eq!(wide[0].provider_id, "srt-1");
    }

    #[test]
    fn test_rank_is_memoized_per_argument_set() {
        let (engine, _clock) = engine();
        let reference = engine.check_availability("380001").locality.unwrap();
        let first = engine.rank(&reference, &candidates(), SortKey::Distance, None).unwrap();
        let again = engine.rank(&reference, &candidates(), SortKey::Distance, Some(50.0)).unwrap();
        assert_eq!(first, again);
        assert_eq!(engine.cache_sizes().1, 1);

        engine.rank(&reference, &candidates(), SortKey::Rating, None).unwrap();
        let mut fewer = candidates();
        fewer.pop();
        engine.rank(&reference, &fewer, SortKey::Distance, None).unwrap();
        assert_eq!(engine.cache_sizes().1, 3);
    }

    #[test]
    fn test_invalid_radius_is_not_cached() {
        let (engine, _clock) = engine();
        let reference = engine.check_availability("380001").locality.unwrap();
        let err = engine.rank(&reference, &candidates(), SortKey::Distance, Some(-1.0));
        assert_eq!(err, Err(EngineError::InvalidRadius(-1.0)));
        assert_eq!(engine.cache_sizes().1, 0);
    }

    #[test]
    fn test_rank_for_pincode_without_locality_is_empty() {
        let (engine, _clock) = engine();
        let out = engine.rank_for_pincode("999999", &candidates(), SortKey::Distance, None).unwrap();
        assert_eq!(out.availability.tier, AvailabilityTier::Unavailable);
        assert!(out.providers.is_empty());
    }

    #[test]
    fn test_rank_for_pincode_out_of_region_is_empty() {
        let (engine, _clock) = engine();
        let mumbai = vec![Candidate::new("m", "Mumbai")];
        let out = engine.rank_for_pincode("400001", &mumbai, SortKey::Distance, None).unwrap();
        assert_eq!(out.availability.tier, AvailabilityTier::Unavailable);
        assert!(out.availability.locality.is_some());
        assert!(out.providers.is_empty());
        assert_eq!(engine.cache_sizes().1, 0);
    }

    #[test]
    fn test_rank_for_pincode_ranks_around_locality() {
        let (engine, _clock) = engine();
        let out = engine.rank_for_pincode("382110", &candidates(), SortKey::Rating, None).unwrap();
        assert_eq!(out.availability.tier, AvailabilityTier::Full);
        let ids: Vec<&str> = out.providers.iter().map(|r| r.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["gnr-1", "amd-1"]);
    }

    #[test]
    fn test_clear_caches_empties_both() {
        let (engine, _clock) = engine();
        engine.rank_for_pincode("380001", &candidates(), SortKey::Distance, None).unwrap();
        assert_eq!(engine.cache_sizes(), (1, 1));
        engine.clear_caches();
        assert_eq!(engine.cache_sizes(), (0, 0));
    }
}
