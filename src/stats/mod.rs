//! Attribution aggregates for the dashboard

pub mod range;

use crate::config::StatsConfig;
use crate::models::{
    Campaign, CampaignKpi, CampaignStat, ChannelRanking, CombinationStat, CreatorStat, TodayStat,
};
use crate::storage::Storage;
use chrono::{FixedOffset, NaiveDate};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use range::{clamp_limit, today_in, DateRange, RangeError, RangeMode, RangeParams};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("campaign not found")]
    CampaignNotFound,
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone)]
enum CachedRows {
    Combinations(Arc<Vec<CombinationStat>>),
    Ranking(Arc<Vec<ChannelRanking>>),
}

pub struct StatsService {
    storage: Arc<dyn Storage>,
    offset: FixedOffset,
    cache: Option<Cache<String, CachedRows>>,
}

impl StatsService {
    pub fn new(storage: Arc<dyn Storage>, config: &StatsConfig) -> Self {
        let cache = config.cache_enabled.then(|| {
            Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(config.cache_ttl_secs.max(1)))
                .build()
        });

        Self {
            storage,
            offset: config.offset(),
            cache,
        }
    }

    /// Current date in the reporting time zone
    pub fn today(&self) -> NaiveDate {
        today_in(self.offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Active campaign owned by the advertiser, otherwise not found
    async fn owned_campaign(&self, campaign_id: i64, advertiser_id: i64) -> Result<Campaign, StatsError> {
        self.storage
            .get_campaign(campaign_id)
            .await?
            .filter(|c| c.is_active() && c.advertiser_id == advertiser_id)
            .ok_or(StatsError::CampaignNotFound)
    }

    async fn scoped(
        &self,
        campaign_id: i64,
        advertiser_id: i64,
        params: &RangeParams,
    ) -> Result<(Campaign, DateRange, NaiveDate), StatsError> {
        // Range errors are reported before ownership, like any other bad input
        let mode = params.mode()?;
        let campaign = self.owned_campaign(campaign_id, advertiser_id).await?;
        let today = self.today();
        let range = DateRange::resolve(mode, &campaign, today)?;
        Ok((campaign, range, today))
    }

    pub async fn campaign_kpi(
        &self,
        campaign_id: i64,
        advertiser_id: i64,
        params: &RangeParams,
    ) -> Result<CampaignKpi, StatsError> {
        let (campaign, range, today) = self.scoped(campaign_id, advertiser_id, params).await?;

        let clicks = self
            .storage
            .campaign_kpi_clicks(
                campaign.id,
                DateRange::single_day(today).window(self.offset),
                range.window(self.offset),
            )
            .await?;
        let active_links = self.storage.count_active_links(campaign.id).await?;

        Ok(CampaignKpi {
            today_clicks: clicks.today_clicks,
            range_clicks: clicks.range_clicks,
            total_clicks: clicks.total_clicks,
            active_links,
        })
    }

    /// Every active (creator, channel) pair of the campaign, zero-click pairs included
    pub async fn combinations(
        &self,
        campaign_id: i64,
        advertiser_id: i64,
        params: &RangeParams,
    ) -> Result<Arc<Vec<CombinationStat>>, StatsError> {
        let (campaign, range, today) = self.scoped(campaign_id, advertiser_id, params).await?;

        let key = format!("stats:comb:{}:{}:{}", campaign.id, range.from, range.to);
        if let Some(CachedRows::Combinations(rows)) = self.cached(&key).await {
            return Ok(rows);
        }

        let mut rows = self
            .storage
            .combination_stats(
                campaign.id,
                DateRange::single_day(today).window(self.offset),
                range.window(self.offset),
            )
            .await?;
        mark_top(&mut rows);

        let rows = Arc::new(rows);
        self.store(key, CachedRows::Combinations(Arc::clone(&rows))).await;
        Ok(rows)
    }

    pub async fn channel_ranking(
        &self,
        campaign_id: i64,
        advertiser_id: i64,
        params: &RangeParams,
        limit: Option<i64>,
    ) -> Result<Arc<Vec<ChannelRanking>>, StatsError> {
        let (campaign, range, _) = self.scoped(campaign_id, advertiser_id, params).await?;
        let limit = clamp_limit(limit);

        let key = format!("stats:rank:{}:{}:{}:{}", campaign.id, range.from, range.to, limit);
        if let Some(CachedRows::Ranking(rows)) = self.cached(&key).await {
            return Ok(rows);
        }

        let rows = Arc::new(
            self.storage
                .channel_ranking(campaign.id, range.window(self.offset), limit)
                .await?,
        );
        self.store(key, CachedRows::Ranking(Arc::clone(&rows))).await;
        Ok(rows)
    }

    pub async fn campaign_stats(&self, advertiser_id: i64) -> Result<Vec<CampaignStat>, StatsError> {
        let today = DateRange::single_day(self.today()).window(self.offset);
        Ok(self.storage.campaign_stats(advertiser_id, today).await?)
    }

    pub async fn creator_stats(&self, advertiser_id: i64) -> Result<Vec<CreatorStat>, StatsError> {
        let today = DateRange::single_day(self.today()).window(self.offset);
        Ok(self.storage.creator_stats(advertiser_id, today).await?)
    }

    pub async fn today_stats(&self, advertiser_id: i64) -> Result<TodayStat, StatsError> {
        let today = DateRange::single_day(self.today()).window(self.offset);
        let today_clicks = self.storage.today_clicks(advertiser_id, today).await?;
        Ok(TodayStat { today_clicks })
    }

    /// Drops every cached result
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    async fn cached(&self, key: &str) -> Option<CachedRows> {
        let cache = self.cache.as_ref()?;
        let hit = cache.get(key).await;
        if hit.is_none() {
            tracing::debug!(key, "Stats cache miss");
        }
        hit
    }

    async fn store(&self, key: String, rows: CachedRows) {
        if let Some(cache) = &self.cache {
            cache.insert(key, rows).await;
        }
    }
}

/// Flags the leading combination when it actually has clicks in range
pub fn mark_top(rows: &mut [CombinationStat]) {
    for row in rows.iter_mut() {
        row.top = false;
    }
    if let Some(first) = rows.first_mut() {
        first.top = first.range_clicks > 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(creator_id: i64, range_clicks: i64) -> CombinationStat {
        CombinationStat {
            creator_id,
            creator_name: format!("creator {creator_id}"),
            channel_id: 1,
            channel_display_name: "YouTube > Description".into(),
            today_clicks: 0,
            range_clicks,
            total_clicks: range_clicks,
            top: false,
        }
    }

    #[test]
    fn top_goes_to_first_row_with_clicks() {
        let mut rows = vec![row(1, 5), row(2, 5), row(3, 0)];
        mark_top(&mut rows);
        assert_eq!(rows.iter().map(|r| r.top).collect::<Vec<_>>(), vec![true, false, false]);
    }

    #[test]
    fn no_top_when_leader_has_no_range_clicks() {
        let mut rows = vec![row(1, 0), row(2, 0)];
        mark_top(&mut rows);
        assert!(rows.iter().all(|r| !r.top));

        let mut empty: Vec<CombinationStat> = Vec::new();
        mark_top(&mut empty);
    }

    #[test]
    fn stale_flags_are_cleared() {
        let mut rows = vec![row(1, 3), row(2, 1)];
        rows[1].top = true;
        mark_top(&mut rows);
        assert!(rows[0].top);
        assert!(!rows[1].top);
    }
}
