use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Caller contract violations. Malformed or unknown pincodes are not errors;
/// they come back as an unavailable [`crate::locality::AvailabilityResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("radius must be a finite, non-negative number of kilometres (got {0})")]
    InvalidRadius(f64),
    #[error("unknown sort key '{0}'; expected distance, rating, price-low, price-high or experience")]
    UnknownSortKey(String),
}

/// Top-level error for the binary and the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Engine(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string(), "code": status.as_u16() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_bad_request() {
        let resp = AppError::from(EngineError::InvalidRadius(-1.0)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = EngineError::UnknownSortKey("cheapest".into());
        assert!(err.to_string().contains("'cheapest'"));
        let err = EngineError::InvalidRadius(f64::NAN);
        assert!(err.to_string().contains("NaN"));
    }
}
