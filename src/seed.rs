//! Load-test data: bulk seeding, synthetic click history and wipes
//!
//! Everything here goes through the [`Storage`] trait so seeded rows obey the
//! same uniqueness rules as rows created through the API.

use chrono::{Duration, FixedOffset, NaiveDate};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::auth::hash_password;
use crate::models::{
    is_http_url, normalize_email, CampaignFields, Channel, ChannelFields, CreatorFields, NewClick,
    NewTrackingLink,
};
use crate::registry::{generate_slug, MAX_SLUG_ATTEMPTS};
use crate::stats::range::local_midnight;
use crate::storage::{ResetCounts, Storage, StorageError};

pub const PLATFORMS: [&str; 5] = ["Instagram", "YouTube", "Blog", "TikTok", "X"];
pub const PLACEMENTS: [&str; 5] = ["Story", "Feed", "Description", "Body", "Bio"];

pub const DEFAULT_SLUG_LIMIT: i64 = 1000;
const MAX_SLUG_LIMIT: i64 = 100_000;
const MIN_CLICK_BATCH: usize = 1000;
const MAX_INACTIVE_RATIO: f64 = 0.99;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<StorageError> for SeedError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Other(e) => SeedError::Storage(e),
            other => SeedError::Storage(anyhow::anyhow!(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedRequest {
    pub user_email: String,
    pub user_name: String,
    pub password: String,
    pub campaigns: usize,
    pub creators: usize,
    pub channels: usize,
    pub links_per_creator: usize,
    pub inactive_link_ratio: f64,
    pub landing_url: String,
}

impl Default for SeedRequest {
    fn default() -> Self {
        Self {
            user_email: "seed@creatorlink.com".to_string(),
            user_name: "Seed User".to_string(),
            password: "seed-password".to_string(),
            campaigns: 1,
            creators: 50,
            channels: 20,
            links_per_creator: 20,
            inactive_link_ratio: 0.0,
            landing_url: "https://example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeedResult {
    pub user_id: i64,
    pub campaigns: usize,
    pub creators: usize,
    pub channels: usize,
    pub tracking_links_total: usize,
    pub tracking_links_active: usize,
    pub tracking_links_inactive: usize,
    pub inactive_link_ratio_applied: f64,
    /// First seeded campaign; the one links and clicks are generated for
    pub campaign_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedClicksRequest {
    pub campaign_id: i64,
    pub total_rows: usize,
    pub batch_size: usize,
    pub days_back_from: i64,
    pub days_back_to: i64,
    /// Share of clicks sent to the hot link pool
    pub skew_ratio: f64,
    pub hot_link_top_k: usize,
}

impl Default for SeedClicksRequest {
    fn default() -> Self {
        Self {
            campaign_id: 0,
            total_rows: 0,
            batch_size: 5000,
            days_back_from: 90,
            days_back_to: 30,
            skew_ratio: 0.2,
            hot_link_top_k: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedClicksResult {
    pub inserted: usize,
    pub elapsed_ms: u64,
}

/// Builds an advertiser with campaigns, creators, channels and links in one go.
///
/// The advertiser is reused when the email already exists. Channels reuse an
/// active row with the same key or restore an inactive one.
pub async fn seed(storage: &Arc<dyn Storage>, request: &SeedRequest, today: NaiveDate) -> Result<SeedResult, SeedError> {
    let landing_url = request.landing_url.trim();
    if !is_http_url(landing_url) {
        return Err(SeedError::Invalid("landingUrl must be an absolute http(s) URL".to_string()));
    }
    let email = normalize_email(&request.user_email)
        .ok_or_else(|| SeedError::Invalid("userEmail must be a valid email address".to_string()))?;

    let advertiser = match storage.get_advertiser_by_email(&email).await? {
        Some(existing) => existing,
        None => {
            let hash = hash_password(&request.password).await?;
            storage
                .create_advertiser(&email, &request.user_name, &hash)
                .await?
        }
    };

    let mut campaign_ids = Vec::with_capacity(request.campaigns.max(1));
    for i in 1..=request.campaigns.max(1) {
        let campaign = storage
            .create_campaign(
                advertiser.id,
                &CampaignFields {
                    name: format!("Campaign {i}"),
                    description: Some("seed".to_string()),
                    landing_url: landing_url.to_string(),
                    start_date: Some(today - Duration::days(30)),
                    end_date: Some(today + Duration::days(30)),
                },
            )
            .await?;
        campaign_ids.push(campaign.id);
    }
    let campaign_id = campaign_ids[0];

    let mut creator_ids = Vec::with_capacity(request.creators);
    for i in 1..=request.creators {
        let creator = storage
            .create_creator(
                advertiser.id,
                &CreatorFields {
                    name: format!("Creator {i}"),
                    channel_name: format!("ChannelName {i}"),
                    channel_url: format!("https://example.com/creator/{i}"),
                    note: Some("seed".to_string()),
                },
            )
            .await?;
        creator_ids.push(creator.id);
    }

    let channel_count = request.channels.min(PLATFORMS.len() * PLACEMENTS.len());
    let mut channel_ids = Vec::with_capacity(channel_count);
    for (platform, placement) in channel_keys().take(channel_count) {
        let channel = seed_channel(storage.as_ref(), advertiser.id, platform, placement).await?;
        channel_ids.push(channel.id);
    }

    let links_per_creator = request.links_per_creator.min(channel_ids.len());
    if links_per_creator < request.links_per_creator {
        tracing::warn!(
            requested = request.links_per_creator,
            channels = channel_ids.len(),
            "linksPerCreator exceeds channel count, clamping"
        );
    }

    let inactive_ratio = request.inactive_link_ratio.clamp(0.0, MAX_INACTIVE_RATIO);
    let mut active = 0;
    let mut inactive = 0;

    for &creator_id in &creator_ids {
        let mut channels = channel_ids.clone();
        channels.shuffle(&mut rand::rng());

        for &channel_id in channels.iter().take(links_per_creator) {
            let link_id = mint_seed_link(storage.as_ref(), campaign_id, creator_id, channel_id, landing_url).await?;

            if rand::random::<f64>() < inactive_ratio {
                storage.deactivate_link(link_id).await?;
                inactive += 1;
            } else {
                active += 1;
            }
        }
    }

    if active < 100 {
        tracing::warn!(active, inactive_ratio, "Few active tracking links seeded");
    }

    tracing::info!(
        advertiser_id = advertiser.id,
        campaign_id,
        creators = creator_ids.len(),
        channels = channel_ids.len(),
        links = active + inactive,
        "Seeded load-test data"
    );

    Ok(SeedResult {
        user_id: advertiser.id,
        campaigns: campaign_ids.len(),
        creators: creator_ids.len(),
        channels: channel_ids.len(),
        tracking_links_total: active + inactive,
        tracking_links_active: active,
        tracking_links_inactive: inactive,
        inactive_link_ratio_applied: inactive_ratio,
        campaign_id,
    })
}

/// Every (platform, placement) pair, platform-major
pub fn channel_keys() -> impl Iterator<Item = (&'static str, &'static str)> {
    PLATFORMS
        .iter()
        .flat_map(|&platform| PLACEMENTS.iter().map(move |&placement| (platform, placement)))
}

async fn seed_channel(
    storage: &dyn Storage,
    advertiser_id: i64,
    platform: &str,
    placement: &str,
) -> Result<Channel, SeedError> {
    let fields = ChannelFields::new(
        platform.to_string(),
        placement.to_string(),
        Some(format!("{platform} + {placement}")),
        None,
        Some("seed".to_string()),
    );

    match storage.find_channel_by_key(advertiser_id, platform, placement).await? {
        Some(channel) if channel.is_active() => Ok(channel),
        Some(channel) => storage
            .restore_channel(channel.id, &fields)
            .await?
            .ok_or_else(|| SeedError::Storage(anyhow::anyhow!("channel {} changed during restore", channel.id))),
        None => Ok(storage.create_channel(advertiser_id, &fields).await?),
    }
}

async fn mint_seed_link(
    storage: &dyn Storage,
    campaign_id: i64,
    creator_id: i64,
    channel_id: i64,
    final_url: &str,
) -> Result<i64, SeedError> {
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let link = NewTrackingLink {
            campaign_id,
            creator_id,
            channel_id,
            slug: generate_slug(),
            final_url: final_url.to_string(),
        };
        match storage.create_link(&link).await {
            Ok(created) => return Ok(created.id),
            Err(StorageError::SlugTaken) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(SeedError::Storage(anyhow::anyhow!(
        "could not allocate a unique slug after {MAX_SLUG_ATTEMPTS} attempts"
    )))
}

/// Inserts synthetic clicks spread over past days of the reporting time zone.
///
/// A `skew_ratio` share of clicks lands on a random pool of `hot_link_top_k`
/// links so rankings have a visible head.
pub async fn seed_clicks(
    storage: &Arc<dyn Storage>,
    request: &SeedClicksRequest,
    today: NaiveDate,
    offset: FixedOffset,
) -> Result<SeedClicksResult, SeedError> {
    let started = Instant::now();

    let link_ids: Vec<i64> = storage
        .list_links(request.campaign_id)
        .await?
        .into_iter()
        .map(|link| link.id)
        .collect();
    if link_ids.is_empty() {
        return Err(SeedError::Invalid(format!(
            "campaign {} has no active tracking links; seed links first",
            request.campaign_id
        )));
    }

    let hot = pick_hot_links(&link_ids, request.hot_link_top_k);
    let oldest = request.days_back_from.max(request.days_back_to).max(0);
    let newest = request.days_back_from.min(request.days_back_to).max(0);
    let batch_size = request.batch_size.max(MIN_CLICK_BATCH);

    let mut inserted = 0;
    while inserted < request.total_rows {
        let size = batch_size.min(request.total_rows - inserted);
        let batch: Vec<NewClick> = (0..size)
            .map(|_| {
                let tracking_link_id = if request.skew_ratio > 0.0
                    && !hot.is_empty()
                    && rand::random::<f64>() < request.skew_ratio
                {
                    hot[rand::random_range(0..hot.len())]
                } else {
                    link_ids[rand::random_range(0..link_ids.len())]
                };
                let day = today - Duration::days(rand::random_range(newest..=oldest));
                NewClick {
                    tracking_link_id,
                    clicked_at: local_midnight(day, offset) + rand::random_range(0..SECONDS_PER_DAY),
                    ip: None,
                    user_agent: None,
                    referer: None,
                }
            })
            .collect();

        storage.record_clicks(&batch).await?;
        storage.flush_pending().await?;
        inserted += size;
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(campaign_id = request.campaign_id, inserted, elapsed_ms, "Seeded clicks");

    Ok(SeedClicksResult { inserted, elapsed_ms })
}

fn pick_hot_links(link_ids: &[i64], top_k: usize) -> Vec<i64> {
    let mut pool = link_ids.to_vec();
    pool.shuffle(&mut rand::rng());
    pool.truncate(top_k.min(link_ids.len()));
    pool
}

/// Deletes every row of every table
pub async fn reset(storage: &Arc<dyn Storage>) -> anyhow::Result<ResetCounts> {
    let counts = storage.reset().await?;
    tracing::warn!(?counts, "Wiped all data");
    Ok(counts)
}

/// Active slugs for load generators, oldest first
pub async fn active_slugs(storage: &Arc<dyn Storage>, limit: Option<i64>) -> anyhow::Result<Vec<String>> {
    let limit = limit.unwrap_or(DEFAULT_SLUG_LIMIT).clamp(1, MAX_SLUG_LIMIT);
    storage.list_active_slugs(limit).await
}
