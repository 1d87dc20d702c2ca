use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::indexing::RebuildReport;
use crate::AppState;

/// Rebuild route and nearby indexes for every vehicle (admin)
pub async fn rebuild_indexes(State(state): State<AppState>) -> AppResult<Json<RebuildReport>> {
    let report = state.indexer.rebuild_all().await?;
    Ok(Json(report))
}
