use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{require_advertiser, required, AdvertiserQuery, AppState};
use crate::api::error::{ApiError, ApiResult};
use crate::models::{
    non_blank, CreateCreatorRequest, Creator, CreatorFields, CreatorResponse, UpdateCreatorRequest,
};

fn creator_fields(
    name: &str,
    channel_name: &str,
    channel_url: &str,
    note: Option<String>,
) -> ApiResult<CreatorFields> {
    Ok(CreatorFields {
        name: required(name, "name")?,
        channel_name: required(channel_name, "channelName")?,
        channel_url: required(channel_url, "channelUrl")?,
        note: non_blank(note).map(|n| n.trim().to_string()),
    })
}

async fn owned_creator(state: &AppState, id: i64, advertiser_id: i64) -> ApiResult<Creator> {
    state
        .storage
        .get_creator(id)
        .await?
        .filter(|c| c.is_active() && c.advertiser_id == advertiser_id)
        .ok_or_else(|| ApiError::not_found("creator"))
}

pub async fn create_creator(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCreatorRequest>,
) -> ApiResult<(StatusCode, Json<CreatorResponse>)> {
    let fields = creator_fields(
        &payload.name,
        &payload.channel_name,
        &payload.channel_url,
        payload.note,
    )?;
    let advertiser = require_advertiser(&state, payload.advertiser_id).await?;

    let creator = state.storage.create_creator(advertiser.id, &fields).await?;
    Ok((StatusCode::CREATED, Json(creator.into())))
}

pub async fn list_creators(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<Vec<CreatorResponse>>> {
    let creators = state.storage.list_creators(query.advertiser_id).await?;
    Ok(Json(creators.into_iter().map(Into::into).collect()))
}

pub async fn get_creator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<CreatorResponse>> {
    Ok(Json(owned_creator(&state, id, query.advertiser_id).await?.into()))
}

pub async fn update_creator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCreatorRequest>,
) -> ApiResult<Json<CreatorResponse>> {
    let fields = creator_fields(
        &payload.name,
        &payload.channel_name,
        &payload.channel_url,
        payload.note,
    )?;
    owned_creator(&state, id, payload.advertiser_id).await?;

    let creator = state
        .storage
        .update_creator(id, &fields)
        .await?
        .ok_or_else(|| ApiError::not_found("creator"))?;
    state.stats.invalidate();

    Ok(Json(creator.into()))
}

/// Soft delete; the creator's active links are deactivated with it
pub async fn delete_creator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<StatusCode> {
    owned_creator(&state, id, query.advertiser_id).await?;

    state.storage.deactivate_creator(id).await?;
    state.stats.invalidate();
    tracing::info!(creator_id = id, "Deactivated creator and its links");

    Ok(StatusCode::NO_CONTENT)
}
