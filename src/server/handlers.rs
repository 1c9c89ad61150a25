use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::AppError;
use crate::locality::validate::coerce;
use crate::locality::{AvailabilityResult, AvailabilityTier, CityInfo, ResolutionOutcome};
use crate::proximity::{Candidate, NearbyArea, RankedProvider, SortKey};

use super::state::AppState;

// ─── Wire shapes ─────────────────────────────────────────────────

/// Flat availability view: `{tier, city, district, state, nearby, message}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub tier: AvailabilityTier,
    pub outcome: ResolutionOutcome,
    pub pincode: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub nearby: Vec<String>,
    pub message: String,
}

impl From<AvailabilityResult> for AvailabilityResponse {
    fn from(result: AvailabilityResult) -> Self {
        let locality = result.locality;
        Self {
            tier: result.tier,
            outcome: result.outcome,
            pincode: locality.as_ref().map(|l| l.code.to_string()),
            city: locality.as_ref().map(|l| l.city_name.clone()),
            district: locality.as_ref().map(|l| l.district_name.clone()),
            region: locality.as_ref().map(|l| l.region_name.clone()),
            state: locality.map(|l| l.state_name),
            nearby: result.nearby_localities,
            message: result.message,
        }
    }
}

// ─── GET /api/availability ───────────────────────────────────────

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub pincode: Option<String>,
}

pub async fn availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> Json<AvailabilityResponse> {
    let start = Instant::now();
    let raw = params.pincode.unwrap_or_default();
    let result = state.engine.check_availability(&raw);

    info!(
        pincode = %raw.trim(),
        tier = %result.tier,
        outcome = %result.outcome,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/availability"
    );

    Json(result.into())
}

// ─── POST /api/rank ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RankRequest {
    /// Accepts a string or a bare number; anything else is an invalid pincode.
    #[serde(default)]
    pub pincode: serde_json::Value,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub sort: Option<String>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub availability: AvailabilityResponse,
    pub sort: SortKey,
    pub providers: Vec<RankedProvider>,
}

pub async fn rank(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RankRequest>,
) -> Result<Json<RankResponse>, AppError> {
    let start = Instant::now();
    let sort = match body.sort.as_deref() {
        Some(s) => s.parse::<SortKey>().inspect_err(|e| warn!(error = %e, "rejected rank request"))?,
        None => SortKey::default(),
    };
    let raw = coerce(&body.pincode).unwrap_or_default();

    let ranking = state
        .engine
        .rank_for_pincode(&raw, &body.candidates, sort, body.radius_km)
        .inspect_err(|e| warn!(error = %e, "rejected rank request"))?;

    info!(
        pincode = %raw.trim(),
        %sort,
        candidates = body.candidates.len(),
        ranked = ranking.providers.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "POST /api/rank"
    );

    Ok(Json(RankResponse {
        availability: ranking.availability.into(),
        sort,
        providers: ranking.providers,
    }))
}

// ─── GET /api/localities, /api/regions ───────────────────────────

#[derive(Deserialize)]
pub struct LocalitiesQuery {
    pub region: Option<String>,
}

pub async fn localities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocalitiesQuery>,
) -> Json<Vec<CityInfo>> {
    let registry = state.engine.registry();
    Json(match params.region.as_deref() {
        Some(region) => registry.localities_in_region(region),
        None => registry.city_list(),
    })
}

pub async fn regions(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.registry().regions())
}

// ─── GET /api/distance ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistanceQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub from: String,
    pub to: String,
    pub distance_km: Option<f64>,
}

pub async fn distance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistanceQuery>,
) -> Json<DistanceResponse> {
    let from = params.from.unwrap_or_default();
    let to = params.to.unwrap_or_default();
    let distance_km = state.engine.distance_between(&from, &to);
    Json(DistanceResponse { from, to, distance_km })
}

// ─── GET /api/nearby ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub place: Option<String>,
    pub radius_km: Option<f64>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyArea>>, AppError> {
    let place = params.place.unwrap_or_default();
    let areas = state.engine.nearby_areas(&place, params.radius_km)?;
    Ok(Json(areas))
}

// ─── POST /api/cache/clear ───────────────────────────────────────

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.engine.clear_caches();
    info!("caches cleared");
    StatusCode::NO_CONTENT
}
