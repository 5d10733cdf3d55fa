mod auth;
mod campaigns;
mod channels;
mod creators;
mod links;
mod stats;
mod testdata;
mod uploads;

pub use auth::{login, signup};
pub use campaigns::{create_campaign, delete_campaign, get_campaign, list_campaigns, update_campaign};
pub use channels::{
    create_channel, delete_channel, get_channel, list_channels, patch_channel, update_channel,
};
pub use creators::{create_creator, delete_creator, get_creator, list_creators, update_creator};
pub use links::{create_link, delete_link, get_link, list_links};
pub use stats::{
    campaign_kpi, campaign_stats, channel_ranking, combination_stats, creator_stats, today_stats,
};
pub use testdata::{reset_data, seed_clicks, seed_data, slugs};
pub use uploads::upload_image;

use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use crate::config::{Config, UploadConfig};
use crate::models::Advertiser;
use crate::registry::LinkRegistry;
use crate::stats::StatsService;
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub registry: Arc<LinkRegistry>,
    pub stats: Arc<StatsService>,
    /// Base of the public tracking URLs handed back to the dashboard
    pub redirect_base_url: String,
    pub upload: UploadConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            registry: Arc::new(LinkRegistry::new(Arc::clone(&storage))),
            stats: Arc::new(StatsService::new(Arc::clone(&storage), &config.stats)),
            redirect_base_url: config.redirect_base_url.clone(),
            upload: config.upload.clone(),
            storage,
        }
    }
}

/// Scopes list, read and delete requests to one advertiser
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiserQuery {
    pub advertiser_id: i64,
}

/// Trimmed value of a mandatory text field
fn required(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

async fn require_advertiser(state: &AppState, advertiser_id: i64) -> ApiResult<Advertiser> {
    state
        .storage
        .get_advertiser(advertiser_id)
        .await?
        .ok_or_else(|| ApiError::not_found("advertiser"))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}
