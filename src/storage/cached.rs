use crate::models::{
    Advertiser, Campaign, CampaignFields, CampaignStat, Channel, ChannelFields, ChannelRanking,
    CombinationStat, Creator, CreatorFields, CreatorStat, KpiClicks, NewClick, NewTrackingLink,
    TimeWindow, TrackingLink, TrackingLinkView,
};
use crate::storage::{ResetCounts, Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time;

type ClickBuffer = DashMap<i64, Vec<NewClick>>;

/// Storage wrapper that caches slug lookups and buffers clicks in memory
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Slug lookups, including misses
    read_cache: Cache<String, Option<TrackingLink>>,
    /// Pending clicks keyed by tracking link id
    click_buffer: Arc<ClickBuffer>,
    /// Held for the whole drain-and-insert so readers that flush see a settled store
    flush_lock: Arc<Mutex<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl CachedStorage {
    pub fn new(
        inner: Arc<dyn Storage>,
        max_cache_entries: u64,
        cache_ttl_secs: u64,
        flush_interval_secs: u64,
    ) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        let click_buffer: Arc<ClickBuffer> = Arc::new(DashMap::new());
        let flush_lock = Arc::new(Mutex::new(()));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        // Start background task to flush click buffer periodically
        let storage = Arc::clone(&inner);
        let buffer = Arc::clone(&click_buffer);
        let lock = Arc::clone(&flush_lock);
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(flush_interval_secs.max(1)));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match flush_click_buffer(&storage, &buffer, &lock).await {
                            Ok(0) => {}
                            Ok(count) => tracing::debug!(count, "Flushed buffered clicks"),
                            Err(e) => tracing::error!("Failed to flush click buffer: {}", e),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            inner,
            read_cache,
            click_buffer,
            flush_lock,
            shutdown_tx,
        }
    }

    /// Writes every buffered click to the underlying storage
    pub async fn flush(&self) -> Result<usize> {
        flush_click_buffer(&self.inner, &self.click_buffer, &self.flush_lock).await
    }

    /// Stops the background task and writes what is left in the buffer
    pub async fn shutdown(&self) -> Result<usize> {
        let _ = self.shutdown_tx.send(true);
        tracing::info!("Shutdown signal received, flushing click buffer...");
        let flushed = self.flush().await?;
        tracing::info!(count = flushed, "Click buffer flushed on shutdown");
        Ok(flushed)
    }

    /// Number of clicks waiting to be written
    pub fn pending_clicks(&self) -> usize {
        self.click_buffer.iter().map(|entry| entry.value().len()).sum()
    }
}

/// Drain the buffer and persist it in one batch.
///
/// On failure the drained clicks go back into the buffer for the next attempt.
async fn flush_click_buffer(
    storage: &Arc<dyn Storage>,
    buffer: &Arc<ClickBuffer>,
    lock: &Arc<Mutex<()>>,
) -> Result<usize> {
    let _guard = lock.lock().await;

    let link_ids: Vec<i64> = buffer.iter().map(|entry| *entry.key()).collect();
    let mut pending = Vec::new();
    for link_id in link_ids {
        if let Some((_, clicks)) = buffer.remove(&link_id) {
            pending.extend(clicks);
        }
    }

    if pending.is_empty() {
        return Ok(0);
    }

    let written = storage.record_clicks(&pending).await;
    if let Err(e) = written {
        for click in pending {
            buffer.entry(click.tracking_link_id).or_default().push(click);
        }
        return Err(e);
    }

    Ok(pending.len())
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create_advertiser(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> StorageResult<Advertiser> {
        self.inner.create_advertiser(email, name, password_hash).await
    }

    async fn get_advertiser(&self, id: i64) -> Result<Option<Advertiser>> {
        self.inner.get_advertiser(id).await
    }

    async fn get_advertiser_by_email(&self, email: &str) -> Result<Option<Advertiser>> {
        self.inner.get_advertiser_by_email(email).await
    }

    async fn create_campaign(&self, advertiser_id: i64, fields: &CampaignFields) -> Result<Campaign> {
        self.inner.create_campaign(advertiser_id, fields).await
    }

    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        self.inner.get_campaign(id).await
    }

    async fn list_campaigns(&self, advertiser_id: i64) -> Result<Vec<Campaign>> {
        self.inner.list_campaigns(advertiser_id).await
    }

    async fn update_campaign(&self, id: i64, fields: &CampaignFields) -> Result<Option<Campaign>> {
        self.inner.update_campaign(id, fields).await
    }

    async fn deactivate_campaign(&self, id: i64) -> Result<bool> {
        self.inner.deactivate_campaign(id).await
    }

    async fn create_creator(&self, advertiser_id: i64, fields: &CreatorFields) -> Result<Creator> {
        self.inner.create_creator(advertiser_id, fields).await
    }

    async fn get_creator(&self, id: i64) -> Result<Option<Creator>> {
        self.inner.get_creator(id).await
    }

    async fn list_creators(&self, advertiser_id: i64) -> Result<Vec<Creator>> {
        self.inner.list_creators(advertiser_id).await
    }

    async fn update_creator(&self, id: i64, fields: &CreatorFields) -> Result<Option<Creator>> {
        self.inner.update_creator(id, fields).await
    }

    async fn deactivate_creator(&self, id: i64) -> Result<bool> {
        let changed = self.inner.deactivate_creator(id).await?;
        // Cascaded links are not known by slug here
        if changed {
            self.read_cache.invalidate_all();
        }
        Ok(changed)
    }

    async fn create_channel(&self, advertiser_id: i64, fields: &ChannelFields) -> StorageResult<Channel> {
        self.inner.create_channel(advertiser_id, fields).await
    }

    async fn find_channel_by_key(
        &self,
        advertiser_id: i64,
        platform: &str,
        placement: &str,
    ) -> Result<Option<Channel>> {
        self.inner
            .find_channel_by_key(advertiser_id, platform, placement)
            .await
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>> {
        self.inner.get_channel(id).await
    }

    async fn list_channels(&self, advertiser_id: i64) -> Result<Vec<Channel>> {
        self.inner.list_channels(advertiser_id).await
    }

    async fn update_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>> {
        self.inner.update_channel(id, fields).await
    }

    async fn restore_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>> {
        self.inner.restore_channel(id, fields).await
    }

    async fn deactivate_channel(&self, id: i64) -> Result<bool> {
        let changed = self.inner.deactivate_channel(id).await?;
        if changed {
            self.read_cache.invalidate_all();
        }
        Ok(changed)
    }

    async fn create_link(&self, link: &NewTrackingLink) -> StorageResult<TrackingLink> {
        let created = self.inner.create_link(link).await?;

        // Replaces any cached miss for this slug
        self.read_cache
            .insert(created.slug.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn get_link(&self, id: i64) -> Result<Option<TrackingLink>> {
        self.inner.get_link(id).await
    }

    async fn get_link_by_slug(&self, slug: &str) -> Result<Option<TrackingLink>> {
        if let Some(cached) = self.read_cache.get(slug).await {
            return Ok(cached);
        }

        tracing::debug!(slug = %slug, "Slug cache miss");
        let result = self.inner.get_link_by_slug(slug).await?;

        self.read_cache.insert(slug.to_string(), result.clone()).await;

        Ok(result)
    }

    async fn list_links(&self, campaign_id: i64) -> Result<Vec<TrackingLinkView>> {
        self.inner.list_links(campaign_id).await
    }

    async fn count_active_links(&self, campaign_id: i64) -> Result<i64> {
        self.inner.count_active_links(campaign_id).await
    }

    async fn deactivate_link(&self, id: i64) -> Result<Option<String>> {
        let slug = self.inner.deactivate_link(id).await?;

        if let Some(ref slug) = slug {
            self.read_cache.invalidate(slug).await;
        }

        Ok(slug)
    }

    async fn list_active_slugs(&self, limit: i64) -> Result<Vec<String>> {
        self.inner.list_active_slugs(limit).await
    }

    async fn record_clicks(&self, clicks: &[NewClick]) -> Result<()> {
        for click in clicks {
            self.click_buffer
                .entry(click.tracking_link_id)
                .or_default()
                .push(click.clone());
        }
        Ok(())
    }

    async fn flush_pending(&self) -> Result<usize> {
        self.flush().await
    }

    async fn campaign_kpi_clicks(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<KpiClicks> {
        self.flush().await?;
        self.inner.campaign_kpi_clicks(campaign_id, today, range).await
    }

    async fn combination_stats(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<Vec<CombinationStat>> {
        self.flush().await?;
        self.inner.combination_stats(campaign_id, today, range).await
    }

    async fn channel_ranking(
        &self,
        campaign_id: i64,
        range: TimeWindow,
        limit: i64,
    ) -> Result<Vec<ChannelRanking>> {
        self.flush().await?;
        self.inner.channel_ranking(campaign_id, range, limit).await
    }

    async fn campaign_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CampaignStat>> {
        self.flush().await?;
        self.inner.campaign_stats(advertiser_id, today).await
    }

    async fn creator_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CreatorStat>> {
        self.flush().await?;
        self.inner.creator_stats(advertiser_id, today).await
    }

    async fn today_clicks(&self, advertiser_id: i64, today: TimeWindow) -> Result<i64> {
        self.flush().await?;
        self.inner.today_clicks(advertiser_id, today).await
    }

    async fn reset(&self) -> Result<ResetCounts> {
        let _guard = self.flush_lock.lock().await;
        self.click_buffer.clear();
        let counts = self.inner.reset().await?;
        self.read_cache.invalidate_all();
        Ok(counts)
    }
}
