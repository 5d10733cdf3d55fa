use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Half-open instant window `[start, end)` in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStat {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub total_clicks: i64,
    pub today_clicks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStat {
    pub creator_id: i64,
    pub creator_name: String,
    pub total_clicks: i64,
    pub today_clicks: i64,
}

/// Performance of one (creator, channel) pair within a campaign
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CombinationStat {
    pub creator_id: i64,
    pub creator_name: String,
    pub channel_id: i64,
    pub channel_display_name: String,
    pub today_clicks: i64,
    pub range_clicks: i64,
    pub total_clicks: i64,
    /// Set on the leading row when it has clicks in range
    #[sqlx(skip)]
    #[serde(default)]
    pub top: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRanking {
    pub channel_id: i64,
    pub channel_display_name: String,
    pub clicks: i64,
}

/// Raw click counters behind a campaign KPI card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct KpiClicks {
    pub today_clicks: i64,
    pub range_clicks: i64,
    pub total_clicks: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignKpi {
    pub today_clicks: i64,
    pub range_clicks: i64,
    pub total_clicks: i64,
    pub active_links: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStat {
    pub today_clicks: i64,
}
