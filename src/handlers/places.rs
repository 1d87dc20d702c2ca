use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::gazetteer::{self, PlaceSuggestion};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaceQuery {
    #[serde(default)]
    pub q: String,
}

/// Autocomplete cities by name, postcode and country code
pub async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PlaceQuery>,
) -> AppResult<Json<Vec<PlaceSuggestion>>> {
    let places = gazetteer::search_places(&state.db, &query.q).await?;
    Ok(Json(places))
}
