//! REST API endpoints.
//!
//! Axum-based HTTP API serving period snapshots, matchup profiles, field
//! simulations and cross-period trends to the dashboard front end.

pub mod cache;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::calculate::simulate::SimulationError;
use crate::storage::LoadError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::UnknownPeriod { .. } | LoadError::MissingDataFile { .. } => {
                tracing::warn!("{}", err);
                ApiError::NotFound(err.to_string())
            }
            LoadError::Malformed { .. } | LoadError::Io { .. } => {
                tracing::error!("{}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.cors_origin.as_str() {
        "*" => CorsLayer::permissive(),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin {:?}, allowing none", origin);
                CorsLayer::new()
            }
        },
    };

    Router::new()
        .route("/api/periods", get(routes::periods::list_periods))
        .route("/api/periods/:key", get(routes::periods::get_snapshot))
        .route("/api/periods/:key/matrix", get(routes::analytics::matrix))
        .route(
            "/api/periods/:key/archetypes/:name",
            get(routes::analytics::archetype_profile),
        )
        .route("/api/periods/:key/overview", get(routes::analytics::overview))
        .route("/api/periods/:key/simulate", post(routes::analytics::simulate))
        .route("/api/trends", get(routes::analytics::trends))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_load_error_status_codes() {
        let not_found: ApiError = LoadError::MissingDataFile {
            period: "1_month".to_string(),
            path: PathBuf::from("data/mtgdecks_matrix_1_month.json"),
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let unknown: ApiError = LoadError::UnknownPeriod {
            period: "10_years".to_string(),
        }
        .into();
        assert_eq!(unknown.into_response().status(), StatusCode::NOT_FOUND);

        let malformed: ApiError = LoadError::Malformed {
            period: "1_month".to_string(),
            path: PathBuf::from("data/mtgdecks_matrix_1_month.json"),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        }
        .into();
        assert_eq!(
            malformed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("min_games must be positive".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("min_games"));
    }
}
