use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::matching::{service, MatchResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub cargo_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Every vehicle able to carry the cargo, best first
pub async fn find_matches(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> AppResult<Json<MatchResponse>> {
    let matches = service::matches_for_cargo(&state.db, &state.engine, req.cargo_id).await?;
    tracing::info!(cargo_id = %req.cargo_id, matches = matches.len(), "Matches computed");
    Ok(Json(MatchResponse { matches }))
}

/// Top matches for a cargo, `limit` defaulting to the configured page size
pub async fn cargo_matches(
    State(state): State<AppState>,
    Path(cargo_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<MatchResult>>> {
    let mut matches = service::matches_for_cargo(&state.db, &state.engine, cargo_id).await?;
    matches.truncate(query.limit.unwrap_or(state.config.match_default_limit));
    Ok(Json(matches))
}
