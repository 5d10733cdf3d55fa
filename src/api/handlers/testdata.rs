//! Load-test data routes, mounted behind the test token guard

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::api::error::ApiResult;
use crate::seed::{self, SeedClicksRequest, SeedClicksResult, SeedRequest, SeedResult};
use crate::storage::ResetCounts;

#[derive(Debug, Deserialize)]
pub struct SlugsQuery {
    pub limit: Option<i64>,
}

pub async fn reset_data(State(state): State<Arc<AppState>>) -> ApiResult<Json<ResetCounts>> {
    let counts = seed::reset(&state.storage).await?;
    state.stats.invalidate();
    Ok(Json(counts))
}

/// Body is optional; every field has a default
pub async fn seed_data(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SeedRequest>>,
) -> ApiResult<Json<SeedResult>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let result = seed::seed(&state.storage, &request, state.stats.today()).await?;
    state.stats.invalidate();
    Ok(Json(result))
}

pub async fn seed_clicks(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SeedClicksRequest>,
) -> ApiResult<Json<SeedClicksResult>> {
    let result = seed::seed_clicks(
        &state.storage,
        &payload,
        state.stats.today(),
        state.stats.offset(),
    )
    .await?;
    state.stats.invalidate();
    Ok(Json(result))
}

pub async fn slugs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlugsQuery>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(seed::active_slugs(&state.storage, query.limit).await?))
}
