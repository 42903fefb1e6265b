use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::TimeWindowSnapshot;
use crate::storage::PeriodAvailability;

#[derive(Debug, Serialize)]
pub struct PeriodsResponse {
    pub periods: Vec<PeriodAvailability>,
}

pub async fn list_periods(State(state): State<AppState>) -> Json<PeriodsResponse> {
    Json(PeriodsResponse {
        periods: state.loader.availability(),
    })
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TimeWindowSnapshot>, ApiError> {
    let snapshot = state.snapshot(&key).await?;
    Ok(Json((*snapshot).clone()))
}
