use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::{AdvertiserQuery, AppState};
use crate::api::error::ApiResult;
use crate::models::{
    CampaignKpi, CampaignStat, ChannelRanking, CombinationStat, CreatorStat, TodayStat,
};
use crate::stats::RangeParams;

/// `advertiserId` plus either `from`/`to` or `range=all|7days`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatsQuery {
    pub advertiser_id: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub range: Option<String>,
    pub limit: Option<i64>,
}

impl CampaignStatsQuery {
    fn range_params(&self) -> RangeParams {
        RangeParams {
            from: self.from,
            to: self.to,
            range: self.range.clone(),
        }
    }
}

pub async fn campaign_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<Vec<CampaignStat>>> {
    Ok(Json(state.stats.campaign_stats(query.advertiser_id).await?))
}

pub async fn creator_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<Vec<CreatorStat>>> {
    Ok(Json(state.stats.creator_stats(query.advertiser_id).await?))
}

pub async fn today_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdvertiserQuery>,
) -> ApiResult<Json<TodayStat>> {
    Ok(Json(state.stats.today_stats(query.advertiser_id).await?))
}

pub async fn campaign_kpi(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<i64>,
    Query(query): Query<CampaignStatsQuery>,
) -> ApiResult<Json<CampaignKpi>> {
    let kpi = state
        .stats
        .campaign_kpi(campaign_id, query.advertiser_id, &query.range_params())
        .await?;
    Ok(Json(kpi))
}

pub async fn combination_stats(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<i64>,
    Query(query): Query<CampaignStatsQuery>,
) -> ApiResult<Json<Arc<Vec<CombinationStat>>>> {
    let rows = state
        .stats
        .combinations(campaign_id, query.advertiser_id, &query.range_params())
        .await?;
    Ok(Json(rows))
}

pub async fn channel_ranking(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<i64>,
    Query(query): Query<CampaignStatsQuery>,
) -> ApiResult<Json<Arc<Vec<ChannelRanking>>>> {
    let rows = state
        .stats
        .channel_ranking(
            campaign_id,
            query.advertiser_id,
            &query.range_params(),
            query.limit,
        )
        .await?;
    Ok(Json(rows))
}
