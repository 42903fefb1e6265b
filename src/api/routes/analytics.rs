use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::compare::{compare_snapshots, PeriodComparison};
use crate::calculate::profile::{matchup_profile, matrix_view, MatchupProfile, MatrixSort, MatrixView};
use crate::calculate::simulate::{default_field, project_field, FieldComposition, ProjectedResult};
use crate::models::{sorted_by_win_rate, ArchetypeRecord, MetaShareMap, TimeWindowSnapshot};

/// Archetypes shown in a matrix when none are selected.
const DEFAULT_MATRIX_DECKS: usize = 8;

/// Matrix cells with fewer games are hidden unless asked otherwise.
const DEFAULT_MATRIX_MIN_GAMES: u32 = 5;

const DEFAULT_OVERVIEW_LIMIT: usize = 5;

// ── Matrix Endpoint ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatrixParams {
    /// Comma-separated archetype names
    pub decks: Option<String>,
    pub min_games: Option<u32>,
    pub sort: Option<MatrixSort>,
}

pub async fn matrix(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<MatrixParams>,
) -> Result<Json<MatrixView>, ApiError> {
    let snapshot = state.snapshot(&key).await?;

    let selected: Vec<String> = match params.decks.as_deref() {
        Some(decks) => {
            let selected: Vec<String> = decks
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();

            if selected.is_empty() {
                return Err(ApiError::BadRequest("Select at least one deck".to_string()));
            }
            if let Some(unknown) = selected.iter().find(|d| !snapshot.archetypes.contains(*d)) {
                return Err(ApiError::BadRequest(format!(
                    "Unknown archetype in period {}: {}",
                    key, unknown
                )));
            }
            selected
        }
        None => snapshot
            .archetypes
            .iter()
            .take(DEFAULT_MATRIX_DECKS)
            .cloned()
            .collect(),
    };

    Ok(Json(matrix_view(
        &snapshot.matrix,
        &selected,
        params.min_games.unwrap_or(DEFAULT_MATRIX_MIN_GAMES),
        params.sort.unwrap_or_default(),
    )))
}

// ── Archetype Profile Endpoint ──────────────────────────────────

pub async fn archetype_profile(
    State(state): State<AppState>,
    Path((key, name)): Path<(String, String)>,
) -> Result<Json<MatchupProfile>, ApiError> {
    let snapshot = state.snapshot(&key).await?;
    let settings = state.analytics.profile_settings();

    matchup_profile(&snapshot, &name, &settings)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Archetype {} not found in period {}", name, key)))
}

// ── Overview Endpoint ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OverviewParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub period: String,
    pub label: String,
    pub archetype_count: usize,
    pub total_games: u32,
    /// Best win rates first
    pub top: Vec<ArchetypeRecord>,
    /// Worst win rates first
    pub bottom: Vec<ArchetypeRecord>,
}

pub async fn overview(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<OverviewParams>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let snapshot = state.snapshot(&key).await?;
    let limit = params.limit.unwrap_or(DEFAULT_OVERVIEW_LIMIT);

    let ranked: Vec<&ArchetypeRecord> = sorted_by_win_rate(&snapshot.records)
        .into_iter()
        .filter(|r| r.total_matches > 0)
        .collect();

    let top = ranked.iter().take(limit).map(|r| (*r).clone()).collect();
    let bottom = ranked.iter().rev().take(limit).map(|r| (*r).clone()).collect();

    Ok(Json(OverviewResponse {
        period: snapshot.period.clone(),
        label: snapshot.label.clone(),
        archetype_count: snapshot.archetypes.len(),
        total_games: snapshot.total_games(),
        top,
        bottom,
    }))
}

// ── Simulator Endpoint ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    /// Archetype → percent of the field; the most played decks when absent
    pub field: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub period: String,
    pub assigned_percent: f64,
    pub unknown_percent: f64,
    pub over_allocated: bool,
    pub shares: MetaShareMap,
    pub results: Vec<ProjectedResult>,
}

pub async fn simulate(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let snapshot = state.snapshot(&key).await?;

    let field = match request.field {
        Some(field) => FieldComposition::from_percentages(field)?,
        None => default_field(&snapshot.records),
    };

    if field.over_allocated() {
        tracing::debug!(
            "Field for {} assigns {:.1}%, results are normalized",
            key,
            field.assigned_percent()
        );
    }

    let results = project_field(&snapshot.matrix, &snapshot.archetypes, &field);

    Ok(Json(SimulateResponse {
        period: snapshot.period.clone(),
        assigned_percent: field.assigned_percent(),
        unknown_percent: field.unknown_percent(),
        over_allocated: field.over_allocated(),
        shares: field.shares().clone(),
        results,
    }))
}

// ── Trends Endpoint ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrendsParams {
    pub min_games: Option<u32>,
    /// Comma-separated period keys; every available period when absent
    pub periods: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub min_games: u32,
    #[serde(flatten)]
    pub comparison: PeriodComparison,
}

pub async fn trends(
    State(state): State<AppState>,
    Query(params): Query<TrendsParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let keys: Vec<String> = match params.periods.as_deref() {
        Some(periods) => periods
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        None => state
            .loader
            .available_periods()
            .into_iter()
            .map(|p| p.key.clone())
            .collect(),
    };

    let mut snapshots = Vec::with_capacity(keys.len());
    for key in &keys {
        snapshots.push(state.snapshot(key).await?);
    }

    let refs: Vec<&TimeWindowSnapshot> = snapshots.iter().map(|s| &**s).collect();
    let min_games = params.min_games.unwrap_or(state.analytics.trend_min_games);

    Ok(Json(TrendsResponse {
        min_games,
        comparison: compare_snapshots(&refs).with_min_games(min_games),
    }))
}
