use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use std::sync::Arc;

use super::{require_advertiser, required, AdvertiserQuery, AppState};
use crate::api::error::{ApiError, ApiResult};
use crate::models::{
    is_http_url, non_blank, Campaign, CampaignFields, CampaignResponse, CreateCampaignRequest,
    UpdateCampaignRequest,
};

fn campaign_fields(
    name: &str,
    description: Option<String>,
    landing_url: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> ApiResult<CampaignFields> {
    let name = required(name, "name")?;
    let landing_url = required(landing_url, "landingUrl")?;
    if !is_http_url(&landing_url) {
        return Err(ApiError::bad_request("landingUrl must be an absolute http(s) URL"));
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(ApiError::bad_request("endDate must not be before startDate"));
        }
    }

    Ok(CampaignFields {
        name,
        description: non_blank(description).map(|d| d.trim().to_string()),
        landing_url,
        start_date,
        end_date,
    })
}

/// Active campaign owned by the advertiser
async fn owned_campaign(state: &AppState, id: i64, advertiser_id: i64) -> ApiResult<Campaign> {
    state
        .storage
        .get_campaign(id)
        .await?
        .filter(|c| c.is_active() && c.advertiser_id == advertiser_id)
        .ok_or_else(|| ApiError::not_found("campaign"))
}

pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<CampaignResponse>)> {
    let fields = campaign_fields(
        &payload.name,
        payload.description,
        &payload.landing_url,
        payload.start_date,
        payload.end_date,
    )?;
    let advertiser = require_advertiser(&state, payload.advertiser_id).await?;

    let campaign = state.storage.create_campaign(advertiser.id, &fields).await?;
    tracing::info!(campaign_id = campaign.id, advertiser_id = advertiser.id, "Created campaign");

    Ok((
        StatusCode::CREATED,
        Json(CampaignResponse::from_campaign(campaign, state.stats.today())),
    ))
}

pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<Vec<CampaignResponse>>> {
    let today = state.stats.today();
    let campaigns = state.storage.list_campaigns(query.advertiser_id).await?;

    Ok(Json(
        campaigns
            .into_iter()
            .map(|c| CampaignResponse::from_campaign(c, today))
            .collect(),
    ))
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<CampaignResponse>> {
    let campaign = owned_campaign(&state, id, query.advertiser_id).await?;
    Ok(Json(CampaignResponse::from_campaign(campaign, state.stats.today())))
}

pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<CampaignResponse>> {
    let fields = campaign_fields(
        &payload.name,
        payload.description,
        &payload.landing_url,
        payload.start_date,
        payload.end_date,
    )?;
    owned_campaign(&state, id, payload.advertiser_id).await?;

    let campaign = state
        .storage
        .update_campaign(id, &fields)
        .await?
        .ok_or_else(|| ApiError::not_found("campaign"))?;
    state.stats.invalidate();

    Ok(Json(CampaignResponse::from_campaign(campaign, state.stats.today())))
}

/// Soft delete, refused while the campaign still has active links
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<StatusCode> {
    owned_campaign(&state, id, query.advertiser_id).await?;

    if !state.storage.deactivate_campaign(id).await? {
        return Err(ApiError::Conflict(
            "campaign has active tracking links; deactivate them first".to_string(),
        ));
    }
    state.stats.invalidate();
    tracing::info!(campaign_id = id, "Deactivated campaign");

    Ok(StatusCode::NO_CONTENT)
}
