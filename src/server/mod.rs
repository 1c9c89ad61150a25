mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::engine::LocatorEngine;
use crate::error::AppError;

pub use handlers::{AvailabilityResponse, DistanceResponse, RankResponse};

pub fn build_router(engine: LocatorEngine) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/api/availability", get(handlers::availability))
        .route("/api/rank", post(handlers::rank))
        .route("/api/localities", get(handlers::localities))
        .route("/api/regions", get(handlers::regions))
        .route("/api/distance", get(handlers::distance))
        .route("/api/nearby", get(handlers::nearby))
        .route("/api/cache/clear", post(handlers::clear_cache))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(addr: SocketAddr, engine: LocatorEngine) -> Result<(), AppError> {
    let app = build_router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "pincode locator listening");

    axum::serve(listener, app).await?;
    Ok(())
}
