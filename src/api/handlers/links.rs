use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::models::{CreateTrackingLinkRequest, TrackingLinkResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    pub campaign_id: i64,
    pub advertiser_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkScopeQuery {
    pub advertiser_id: Option<i64>,
}

/// Mint the tracking link for a (campaign, creator, channel) triple
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTrackingLinkRequest>,
) -> ApiResult<(StatusCode, Json<TrackingLinkResponse>)> {
    let link = state.registry.mint(&payload).await?;
    state.stats.invalidate();

    Ok((
        StatusCode::CREATED,
        Json(TrackingLinkResponse::from_link(link, &state.redirect_base_url)),
    ))
}

/// Active links of a campaign with creator and channel details
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLinksQuery>,
) -> ApiResult<Json<Vec<TrackingLinkResponse>>> {
    let links = state.registry.list(query.campaign_id, query.advertiser_id).await?;

    Ok(Json(
        links
            .into_iter()
            .map(|view| TrackingLinkResponse::from_view(view, &state.redirect_base_url))
            .collect(),
    ))
}

pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LinkScopeQuery>,
) -> ApiResult<Json<TrackingLinkResponse>> {
    let link = state
        .storage
        .get_link(id)
        .await?
        .ok_or_else(|| ApiError::not_found("tracking link"))?;

    if let Some(advertiser_id) = query.advertiser_id {
        let owner = state
            .storage
            .get_campaign(link.campaign_id)
            .await?
            .map(|c| c.advertiser_id);
        if owner != Some(advertiser_id) {
            return Err(ApiError::not_found("tracking link"));
        }
    }

    Ok(Json(TrackingLinkResponse::from_link(link, &state.redirect_base_url)))
}

/// Soft delete; the slug stays reserved
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LinkScopeQuery>,
) -> ApiResult<StatusCode> {
    state.registry.deactivate(id, query.advertiser_id).await?;
    state.stats.invalidate();
    Ok(StatusCode::NO_CONTENT)
}
