//! Stats service integration tests: range resolution in the reporting zone,
//! ownership scoping and the optional result cache.

use chrono::NaiveDate;
use creatorlink::config::StatsConfig;
use creatorlink::models::{CampaignFields, ChannelFields, CreatorFields, NewClick, NewTrackingLink};
use creatorlink::stats::range::local_midnight;
use creatorlink::stats::{RangeError, RangeParams, StatsError, StatsService};
use creatorlink::storage::{SqliteStorage, Storage};
use std::sync::Arc;

async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

struct Scenario {
    advertiser_id: i64,
    campaign_id: i64,
    link_ids: Vec<i64>,
}

/// One campaign with a link per creator, all on the same channel
async fn scenario(storage: &Arc<dyn Storage>, email: &str, creators: &[&str]) -> Scenario {
    let advertiser = storage.create_advertiser(email, "Adv", "hash").await.unwrap();
    let campaign = storage
        .create_campaign(
            advertiser.id,
            &CampaignFields {
                name: "Stats".to_string(),
                description: None,
                landing_url: "https://example.com".to_string(),
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
    let channel = storage
        .create_channel(
            advertiser.id,
            &ChannelFields::new("YouTube".into(), "Description".into(), None, None, None),
        )
        .await
        .unwrap();

    let mut link_ids = Vec::new();
    for (i, name) in creators.iter().enumerate() {
        let creator = storage
            .create_creator(
                advertiser.id,
                &CreatorFields {
                    name: name.to_string(),
                    channel_name: name.to_string(),
                    channel_url: format!("https://example.com/{name}"),
                    note: None,
                },
            )
            .await
            .unwrap();
        let link = storage
            .create_link(&NewTrackingLink {
                campaign_id: campaign.id,
                creator_id: creator.id,
                channel_id: channel.id,
                slug: format!("stats{i:03}"),
                final_url: "https://example.com".to_string(),
            })
            .await
            .unwrap();
        link_ids.push(link.id);
    }

    Scenario {
        advertiser_id: advertiser.id,
        campaign_id: campaign.id,
        link_ids,
    }
}

async fn clicks_at(storage: &Arc<dyn Storage>, link_id: i64, times: &[i64]) {
    let clicks: Vec<NewClick> = times
        .iter()
        .map(|&clicked_at| NewClick {
            tracking_link_id: link_id,
            clicked_at,
            ip: None,
            user_agent: None,
            referer: None,
        })
        .collect();
    storage.record_clicks(&clicks).await.unwrap();
}

fn custom(from: NaiveDate, to: NaiveDate) -> RangeParams {
    RangeParams {
        from: Some(from),
        to: Some(to),
        range: None,
    }
}

#[tokio::test]
async fn test_custom_range_is_cut_at_local_midnight() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "zone@example.com", &["ana"]).await;
    let config = StatsConfig::default();
    let stats = StatsService::new(Arc::clone(&storage), &config);

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let start = local_midnight(day, config.offset());
    let next = local_midnight(day.succ_opt().unwrap(), config.offset());
    // Just before, first second, last second, first second of the next day
    clicks_at(&storage, s.link_ids[0], &[start - 1, start, next - 1, next]).await;

    let kpi = stats
        .campaign_kpi(s.campaign_id, s.advertiser_id, &custom(day, day))
        .await
        .unwrap();
    assert_eq!(kpi.range_clicks, 2);
    assert_eq!(kpi.total_clicks, 4);
    assert_eq!(kpi.active_links, 1);
}

#[tokio::test]
async fn test_range_errors_come_before_ownership() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "order@example.com", &["ben"]).await;
    let stats = StatsService::new(Arc::clone(&storage), &StatsConfig::default());

    let inverted = custom(
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    );
    let err = stats.campaign_kpi(s.campaign_id, 9999, &inverted).await.unwrap_err();
    assert!(matches!(err, StatsError::Range(RangeError::Inverted)));

    let err = stats
        .campaign_kpi(s.campaign_id, 9999, &RangeParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StatsError::CampaignNotFound));

    storage.deactivate_link(s.link_ids[0]).await.unwrap();
    assert!(storage.deactivate_campaign(s.campaign_id).await.unwrap());
    let err = stats
        .combinations(s.campaign_id, s.advertiser_id, &RangeParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StatsError::CampaignNotFound));
}

#[tokio::test]
async fn test_combinations_rank_and_flag_top() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "rank@example.com", &["cho", "dan", "eun"]).await;
    let stats = StatsService::new(Arc::clone(&storage), &StatsConfig::default());

    let now = chrono::Utc::now().timestamp();
    clicks_at(&storage, s.link_ids[1], &[now, now, now]).await;
    clicks_at(&storage, s.link_ids[2], &[now]).await;

    let all = RangeParams {
        range: Some("all".to_string()),
        ..RangeParams::default()
    };
    let rows = stats
        .combinations(s.campaign_id, s.advertiser_id, &all)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].creator_name, "dan");
    assert_eq!(rows[0].range_clicks, 3);
    assert_eq!(rows[0].today_clicks, 3);
    assert!(rows[0].top);
    assert!(rows[1..].iter().all(|r| !r.top));
    assert_eq!(rows[2].creator_name, "cho");
    assert_eq!(rows[2].total_clicks, 0);

    // A past window has no leader
    let past = custom(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 7).unwrap(),
    );
    let rows = stats
        .combinations(s.campaign_id, s.advertiser_id, &past)
        .await
        .unwrap();
    assert!(rows.iter().all(|r| !r.top && r.range_clicks == 0));

    let ranking = stats
        .channel_ranking(s.campaign_id, s.advertiser_id, &all, None)
        .await
        .unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].clicks, 4);
}

#[tokio::test]
async fn test_todays_clicks_lead_the_combinations() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "lead@example.com", &["old", "fresh"]).await;
    let stats = StatsService::new(Arc::clone(&storage), &StatsConfig::default());

    let now = chrono::Utc::now().timestamp();
    let yesterday = now - 86_400;
    clicks_at(&storage, s.link_ids[0], &[yesterday; 5]).await;
    clicks_at(&storage, s.link_ids[1], &[now, now]).await;

    let rows = stats
        .combinations(s.campaign_id, s.advertiser_id, &RangeParams::default())
        .await
        .unwrap();
    assert_eq!(rows[0].creator_name, "fresh");
    assert_eq!((rows[0].today_clicks, rows[0].range_clicks), (2, 2));
    assert!(rows[0].top);
    assert_eq!(rows[1].creator_name, "old");
    assert_eq!((rows[1].today_clicks, rows[1].range_clicks), (0, 5));
    assert!(!rows[1].top);
}

#[tokio::test]
async fn test_cache_serves_until_invalidated() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "cache@example.com", &["fay"]).await;
    let config = StatsConfig {
        cache_enabled: true,
        cache_ttl_secs: 600,
        ..StatsConfig::default()
    };
    let stats = StatsService::new(Arc::clone(&storage), &config);
    let params = RangeParams::default();

    let first = stats
        .combinations(s.campaign_id, s.advertiser_id, &params)
        .await
        .unwrap();
    assert_eq!(first[0].range_clicks, 0);

    let now = chrono::Utc::now().timestamp();
    clicks_at(&storage, s.link_ids[0], &[now, now]).await;

    let cached = stats
        .combinations(s.campaign_id, s.advertiser_id, &params)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    stats.invalidate();
    let fresh = stats
        .combinations(s.campaign_id, s.advertiser_id, &params)
        .await
        .unwrap();
    assert_eq!(fresh[0].range_clicks, 2);
    assert!(fresh[0].top);
}

#[tokio::test]
async fn test_without_cache_results_are_always_fresh() {
    let storage = create_test_storage().await;
    let s = scenario(&storage, "nocache@example.com", &["gil"]).await;
    let stats = StatsService::new(Arc::clone(&storage), &StatsConfig::default());
    let params = RangeParams::default();

    let before = stats
        .channel_ranking(s.campaign_id, s.advertiser_id, &params, Some(5))
        .await
        .unwrap();
    // Channels without clicks in range are left out of the ranking
    assert!(before.is_empty());

    clicks_at(&storage, s.link_ids[0], &[chrono::Utc::now().timestamp()]).await;
    let after = stats
        .channel_ranking(s.campaign_id, s.advertiser_id, &params, Some(5))
        .await
        .unwrap();
    assert_eq!(after[0].clicks, 1);

    let today = stats.today_stats(s.advertiser_id).await.unwrap();
    assert_eq!(today.today_clicks, 1);
}
