use crate::models::{
    Advertiser, Campaign, CampaignFields, CampaignStat, Channel, ChannelFields, ChannelRanking,
    CombinationStat, Creator, CreatorFields, CreatorStat, KpiClicks, NewClick, NewTrackingLink,
    TimeWindow, TrackingLink, TrackingLinkView,
};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Generated slug collided with an existing one; the caller may retry with a new slug
    #[error("slug already exists")]
    SlugTaken,
    /// A uniqueness rule on active rows was violated
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Other(err.into())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Row counts removed by [`Storage::reset`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetCounts {
    pub clicks: u64,
    pub tracking_links: u64,
    pub campaigns: u64,
    pub channels: u64,
    pub creators: u64,
    pub advertisers: u64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    // Advertisers

    /// Fails with `Conflict` when the email is already registered
    async fn create_advertiser(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> StorageResult<Advertiser>;

    async fn get_advertiser(&self, id: i64) -> Result<Option<Advertiser>>;

    async fn get_advertiser_by_email(&self, email: &str) -> Result<Option<Advertiser>>;

    // Campaigns

    async fn create_campaign(&self, advertiser_id: i64, fields: &CampaignFields) -> Result<Campaign>;

    /// Any status; callers check ownership and status
    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>>;

    /// Active campaigns of one advertiser, newest first
    async fn list_campaigns(&self, advertiser_id: i64) -> Result<Vec<Campaign>>;

    async fn update_campaign(&self, id: i64, fields: &CampaignFields) -> Result<Option<Campaign>>;

    /// Soft delete in one statement; false when the campaign is missing,
    /// already inactive or still has an active tracking link
    async fn deactivate_campaign(&self, id: i64) -> Result<bool>;

    // Creators

    async fn create_creator(&self, advertiser_id: i64, fields: &CreatorFields) -> Result<Creator>;

    async fn get_creator(&self, id: i64) -> Result<Option<Creator>>;

    async fn list_creators(&self, advertiser_id: i64) -> Result<Vec<Creator>>;

    async fn update_creator(&self, id: i64, fields: &CreatorFields) -> Result<Option<Creator>>;

    /// Deactivates the creator and every active link that uses it
    async fn deactivate_creator(&self, id: i64) -> Result<bool>;

    // Channels

    /// Fails with `Conflict` when an active channel already uses the key
    async fn create_channel(&self, advertiser_id: i64, fields: &ChannelFields) -> StorageResult<Channel>;

    /// Most recent channel with this key, of any status
    async fn find_channel_by_key(
        &self,
        advertiser_id: i64,
        platform: &str,
        placement: &str,
    ) -> Result<Option<Channel>>;

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>>;

    async fn list_channels(&self, advertiser_id: i64) -> Result<Vec<Channel>>;

    /// Fails with `Conflict` when another active channel already uses the key
    async fn update_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>>;

    /// Reactivates an inactive channel with new fields
    async fn restore_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>>;

    /// Deactivates the channel and every active link that uses it
    async fn deactivate_channel(&self, id: i64) -> Result<bool>;

    // Tracking links

    /// Inserts an active link.
    ///
    /// Fails with `Conflict` when the (campaign, creator, channel) triple already
    /// has an active link, and with `SlugTaken` when the slug is in use.
    async fn create_link(&self, link: &NewTrackingLink) -> StorageResult<TrackingLink>;

    async fn get_link(&self, id: i64) -> Result<Option<TrackingLink>>;

    /// Any status; the redirect path decides what to do with inactive links
    async fn get_link_by_slug(&self, slug: &str) -> Result<Option<TrackingLink>>;

    /// Active links of a campaign joined with creator and channel details
    async fn list_links(&self, campaign_id: i64) -> Result<Vec<TrackingLinkView>>;

    async fn count_active_links(&self, campaign_id: i64) -> Result<i64>;

    /// Returns the slug of the deactivated link, `None` if nothing changed
    async fn deactivate_link(&self, id: i64) -> Result<Option<String>>;

    /// Slugs of active links, oldest first
    async fn list_active_slugs(&self, limit: i64) -> Result<Vec<String>>;

    // Clicks

    async fn record_clicks(&self, clicks: &[NewClick]) -> Result<()>;

    /// Persists clicks held in memory, returning how many were written
    async fn flush_pending(&self) -> Result<usize> {
        Ok(0)
    }

    // Aggregates

    /// Clicks on the campaign's active links
    async fn campaign_kpi_clicks(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<KpiClicks>;

    /// One row per active link of the campaign, ordered by range clicks
    async fn combination_stats(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<Vec<CombinationStat>>;

    /// Channels with clicks in range on the campaign's active links
    async fn channel_ranking(
        &self,
        campaign_id: i64,
        range: TimeWindow,
        limit: i64,
    ) -> Result<Vec<ChannelRanking>>;

    async fn campaign_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CampaignStat>>;

    async fn creator_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CreatorStat>>;

    /// Clicks in the window on active links of active campaigns
    async fn today_clicks(&self, advertiser_id: i64, today: TimeWindow) -> Result<i64>;

    // Maintenance

    /// Removes every row from every table
    async fn reset(&self) -> Result<ResetCounts>;
}
