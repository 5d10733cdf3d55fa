use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{require_advertiser, required, AdvertiserQuery, AppState};
use crate::api::error::{ApiError, ApiResult};
use crate::models::{
    Channel, ChannelFields, ChannelResponse, CreateChannelRequest, PatchChannelRequest, PatchError,
    UpdateChannelRequest,
};

fn duplicate_key(fields: &ChannelFields) -> ApiError {
    ApiError::Conflict(format!(
        "channel {} / {} already exists",
        fields.platform, fields.placement
    ))
}

async fn owned_channel(state: &AppState, id: i64, advertiser_id: i64) -> ApiResult<Channel> {
    state
        .storage
        .get_channel(id)
        .await?
        .filter(|c| c.is_active() && c.advertiser_id == advertiser_id)
        .ok_or_else(|| ApiError::not_found("channel"))
}

/// Fails when another active channel of the advertiser already uses the key
async fn ensure_key_free(state: &AppState, channel: &Channel, fields: &ChannelFields) -> ApiResult<()> {
    let holder = state
        .storage
        .find_channel_by_key(channel.advertiser_id, &fields.platform, &fields.placement)
        .await?;

    match holder {
        Some(other) if other.is_active() && other.id != channel.id => Err(duplicate_key(fields)),
        _ => Ok(()),
    }
}

/// Create a channel, reviving an inactive one with the same key
pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateChannelRequest>,
) -> ApiResult<(StatusCode, Json<ChannelResponse>)> {
    let fields = ChannelFields::new(
        required(&payload.platform, "platform")?,
        required(&payload.placement, "placement")?,
        payload.display_name,
        payload.icon_url,
        payload.note,
    );
    let advertiser = require_advertiser(&state, payload.advertiser_id).await?;

    let existing = state
        .storage
        .find_channel_by_key(advertiser.id, &fields.platform, &fields.placement)
        .await?;

    let channel = match existing {
        Some(channel) if channel.is_active() => return Err(duplicate_key(&fields)),
        Some(channel) => {
            let restored = state
                .storage
                .restore_channel(channel.id, &fields)
                .await?
                .ok_or_else(|| duplicate_key(&fields))?;
            tracing::info!(channel_id = restored.id, "Restored inactive channel");
            restored
        }
        None => state.storage.create_channel(advertiser.id, &fields).await?,
    };

    Ok((StatusCode::CREATED, Json(channel.into())))
}

pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<Vec<ChannelResponse>>> {
    let channels = state.storage.list_channels(query.advertiser_id).await?;
    Ok(Json(channels.into_iter().map(Into::into).collect()))
}

pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<ChannelResponse>> {
    Ok(Json(owned_channel(&state, id, query.advertiser_id).await?.into()))
}

/// Full replacement of the editable fields
pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateChannelRequest>,
) -> ApiResult<Json<ChannelResponse>> {
    let fields = ChannelFields::new(
        required(&payload.platform, "platform")?,
        required(&payload.placement, "placement")?,
        payload.display_name,
        payload.icon_url,
        payload.note,
    );
    let channel = owned_channel(&state, id, payload.advertiser_id).await?;
    ensure_key_free(&state, &channel, &fields).await?;

    let updated = state
        .storage
        .update_channel(id, &fields)
        .await?
        .ok_or_else(|| ApiError::not_found("channel"))?;
    state.stats.invalidate();

    Ok(Json(updated.into()))
}

/// Partial update; absent fields keep their stored values
pub async fn patch_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<PatchChannelRequest>,
) -> ApiResult<Json<ChannelResponse>> {
    let channel = owned_channel(&state, id, payload.advertiser_id).await?;

    let (fields, key_changed) = payload.apply(&channel).map_err(|e| match e {
        PatchError::PartialKey => {
            ApiError::bad_request("platform and placement must be changed together")
        }
    })?;
    if key_changed {
        ensure_key_free(&state, &channel, &fields).await?;
    }

    let updated = state
        .storage
        .update_channel(id, &fields)
        .await?
        .ok_or_else(|| ApiError::not_found("channel"))?;
    state.stats.invalidate();

    Ok(Json(updated.into()))
}

/// Soft delete; the channel's active links are deactivated with it
pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<StatusCode> {
    owned_channel(&state, id, query.advertiser_id).await?;

    state.storage.deactivate_channel(id).await?;
    state.stats.invalidate();
    tracing::info!(channel_id = id, "Deactivated channel and its links");

    Ok(StatusCode::NO_CONTENT)
}
