//! Storage integration tests
//!
//! Run against an in-memory SQLite database: uniqueness rules on active rows,
//! soft-delete cascades, click aggregates and the cached wrapper.
//!
//! Backend-specific tests can be filtered with DATABASE_BACKEND:
//! - `DATABASE_BACKEND=sqlite cargo test` - skip the PostgreSQL test
//! - `DATABASE_BACKEND=postgres DATABASE_URL=postgres://... cargo test` - include it

use chrono::NaiveDate;
use creatorlink::models::{
    CampaignFields, ChannelFields, CreatorFields, NewClick, NewTrackingLink, Status, TimeWindow,
};
use creatorlink::registry::generate_slug;
use creatorlink::storage::{CachedStorage, PostgresStorage, SqliteStorage, Storage, StorageError};
use std::sync::Arc;

fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.eq_ignore_ascii_case(backend),
        Err(_) => true,
    }
}

/// PostgreSQL storage when DATABASE_URL points at a reachable server
async fn create_postgres_storage() -> Option<Arc<dyn Storage>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    if !db_url.starts_with("postgres") {
        return None;
    }
    let storage = PostgresStorage::new(&db_url, 5).await.ok()?;
    storage.init().await.ok()?;
    Some(Arc::new(storage))
}

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

struct Fixture {
    advertiser_id: i64,
    campaign_id: i64,
    creator_id: i64,
    channel_id: i64,
}

fn campaign_fields(name: &str) -> CampaignFields {
    CampaignFields {
        name: name.to_string(),
        description: None,
        landing_url: "https://example.com/landing".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        end_date: None,
    }
}

fn creator_fields(name: &str) -> CreatorFields {
    CreatorFields {
        name: name.to_string(),
        channel_name: format!("{name} channel"),
        channel_url: format!("https://example.com/{name}"),
        note: None,
    }
}

fn channel_fields(platform: &str, placement: &str) -> ChannelFields {
    ChannelFields::new(platform.to_string(), placement.to_string(), None, None, None)
}

fn new_link(campaign_id: i64, creator_id: i64, channel_id: i64, slug: &str) -> NewTrackingLink {
    NewTrackingLink {
        campaign_id,
        creator_id,
        channel_id,
        slug: slug.to_string(),
        final_url: "https://example.com/landing".to_string(),
    }
}

fn click(tracking_link_id: i64, clicked_at: i64) -> NewClick {
    NewClick {
        tracking_link_id,
        clicked_at,
        ip: Some("203.0.113.7".to_string()),
        user_agent: None,
        referer: None,
    }
}

async fn fixture(storage: &Arc<dyn Storage>, email: &str) -> Fixture {
    let advertiser = storage
        .create_advertiser(email, "Advertiser", "hash")
        .await
        .unwrap();
    let campaign = storage
        .create_campaign(advertiser.id, &campaign_fields("Spring"))
        .await
        .unwrap();
    let creator = storage
        .create_creator(advertiser.id, &creator_fields("alice"))
        .await
        .unwrap();
    let channel = storage
        .create_channel(advertiser.id, &channel_fields("YouTube", "Description"))
        .await
        .unwrap();

    Fixture {
        advertiser_id: advertiser.id,
        campaign_id: campaign.id,
        creator_id: creator.id,
        channel_id: channel.id,
    }
}

const WINDOW_ALL: TimeWindow = TimeWindow {
    start: 0,
    end: i64::MAX,
};

#[tokio::test]
async fn test_duplicate_advertiser_email_conflicts() {
    let storage = create_test_storage().await;
    storage
        .create_advertiser("a@example.com", "A", "hash")
        .await
        .unwrap();

    let result = storage.create_advertiser("a@example.com", "B", "hash").await;
    assert!(matches!(result, Err(StorageError::Conflict(_))));

    let found = storage
        .get_advertiser_by_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "A");
}

#[tokio::test]
async fn test_campaign_update_and_soft_delete() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "c@example.com").await;

    let mut fields = campaign_fields("Summer");
    fields.end_date = NaiveDate::from_ymd_opt(2025, 8, 31);
    let updated = storage
        .update_campaign(f.campaign_id, &fields)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Summer");
    assert_eq!(updated.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
    assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2025, 8, 31));

    assert!(storage.deactivate_campaign(f.campaign_id).await.unwrap());
    assert!(!storage.deactivate_campaign(f.campaign_id).await.unwrap());

    let campaign = storage.get_campaign(f.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, Status::Inactive);
    assert!(storage.list_campaigns(f.advertiser_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_campaign_with_active_link_stays_active() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "guard@example.com").await;
    let link = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "guard0yt"))
        .await
        .unwrap();

    assert!(!storage.deactivate_campaign(f.campaign_id).await.unwrap());
    let campaign = storage.get_campaign(f.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, Status::Active);

    storage.deactivate_link(link.id).await.unwrap();
    assert!(storage.deactivate_campaign(f.campaign_id).await.unwrap());
    let campaign = storage.get_campaign(f.campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, Status::Inactive);
}

#[tokio::test]
async fn test_active_channel_key_is_unique() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "ch@example.com").await;

    let duplicate = storage
        .create_channel(f.advertiser_id, &channel_fields("YouTube", "Description"))
        .await;
    assert!(matches!(duplicate, Err(StorageError::Conflict(_))));

    // Same key for another advertiser is fine
    let other = storage
        .create_advertiser("other@example.com", "Other", "hash")
        .await
        .unwrap();
    storage
        .create_channel(other.id, &channel_fields("YouTube", "Description"))
        .await
        .unwrap();

    // Moving another channel onto the key is rejected too
    let second = storage
        .create_channel(f.advertiser_id, &channel_fields("Blog", "Body"))
        .await
        .unwrap();
    let moved = storage
        .update_channel(second.id, &channel_fields("YouTube", "Description"))
        .await;
    assert!(matches!(moved, Err(StorageError::Conflict(_))));
}

#[tokio::test]
async fn test_inactive_channel_can_be_restored() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "restore@example.com").await;

    assert!(storage.deactivate_channel(f.channel_id).await.unwrap());

    let found = storage
        .find_channel_by_key(f.advertiser_id, "YouTube", "Description")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, f.channel_id);
    assert_eq!(found.status, Status::Inactive);

    let fields = ChannelFields::new(
        "YouTube".to_string(),
        "Description".to_string(),
        Some("YT desc".to_string()),
        None,
        Some("restored".to_string()),
    );
    let restored = storage
        .restore_channel(f.channel_id, &fields)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.id, f.channel_id);
    assert_eq!(restored.status, Status::Active);
    assert_eq!(restored.display_name, "YT desc");

    // Only inactive rows are restorable
    assert!(storage
        .restore_channel(f.channel_id, &fields)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_find_channel_prefers_active_row() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "prefer@example.com").await;

    storage.deactivate_channel(f.channel_id).await.unwrap();
    let fresh = storage
        .create_channel(f.advertiser_id, &channel_fields("YouTube", "Description"))
        .await
        .unwrap();

    let found = storage
        .find_channel_by_key(f.advertiser_id, "YouTube", "Description")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, fresh.id);
    assert_eq!(found.display_name, "YouTube > Description");
}

#[tokio::test]
async fn test_one_active_link_per_triple() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "triple@example.com").await;

    let first = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "aaaa1111"))
        .await
        .unwrap();
    assert_eq!(first.status, Status::Active);

    let second = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "bbbb2222"))
        .await;
    assert!(matches!(second, Err(StorageError::Conflict(_))));

    let deactivated = storage.deactivate_link(first.id).await.unwrap();
    assert_eq!(deactivated.as_deref(), Some("aaaa1111"));
    assert_eq!(storage.deactivate_link(first.id).await.unwrap(), None);

    let replacement = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "bbbb2222"))
        .await
        .unwrap();
    assert_ne!(replacement.slug, first.slug);

    // The old slug still resolves, as inactive
    let old = storage.get_link_by_slug("aaaa1111").await.unwrap().unwrap();
    assert_eq!(old.status, Status::Inactive);
}

#[tokio::test]
async fn test_reused_slug_is_reported_as_taken() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "slug@example.com").await;
    let other_creator = storage
        .create_creator(f.advertiser_id, &creator_fields("bob"))
        .await
        .unwrap();

    storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "samesame"))
        .await
        .unwrap();

    let result = storage
        .create_link(&new_link(f.campaign_id, other_creator.id, f.channel_id, "samesame"))
        .await;
    assert!(matches!(result, Err(StorageError::SlugTaken)));
}

#[tokio::test]
async fn test_channel_and_creator_delete_cascade_to_links() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "cascade@example.com").await;
    let bob = storage
        .create_creator(f.advertiser_id, &creator_fields("bob"))
        .await
        .unwrap();
    let blog = storage
        .create_channel(f.advertiser_id, &channel_fields("Blog", "Body"))
        .await
        .unwrap();

    storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "alice0yt"))
        .await
        .unwrap();
    storage
        .create_link(&new_link(f.campaign_id, bob.id, f.channel_id, "bob000yt"))
        .await
        .unwrap();
    storage
        .create_link(&new_link(f.campaign_id, bob.id, blog.id, "bob0blog"))
        .await
        .unwrap();
    assert_eq!(storage.count_active_links(f.campaign_id).await.unwrap(), 3);

    storage.deactivate_channel(f.channel_id).await.unwrap();
    let remaining: Vec<String> = storage
        .list_links(f.campaign_id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.slug)
        .collect();
    assert_eq!(remaining, vec!["bob0blog".to_string()]);

    storage.deactivate_creator(bob.id).await.unwrap();
    assert_eq!(storage.count_active_links(f.campaign_id).await.unwrap(), 0);
    assert!(storage.list_active_slugs(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_links_joins_creator_and_channel() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "join@example.com").await;

    storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "joined01"))
        .await
        .unwrap();

    let links = storage.list_links(f.campaign_id).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].creator_name, "alice");
    assert_eq!(links[0].channel_display, "YouTube > Description");
    assert_eq!(links[0].channel_icon_url, None);
}

#[tokio::test]
async fn test_click_aggregates_respect_windows_and_status() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "agg@example.com").await;
    let blog = storage
        .create_channel(f.advertiser_id, &channel_fields("Blog", "Body"))
        .await
        .unwrap();

    let yt = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "clicksyt"))
        .await
        .unwrap();
    let bl = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, blog.id, "clicksbl"))
        .await
        .unwrap();

    // today = [1000, 2000), range = [500, 2000)
    storage
        .record_clicks(&[
            click(yt.id, 100),
            click(yt.id, 600),
            click(yt.id, 1000),
            click(yt.id, 1999),
            click(bl.id, 2000),
            click(bl.id, 700),
        ])
        .await
        .unwrap();

    let today = TimeWindow { start: 1000, end: 2000 };
    let range = TimeWindow { start: 500, end: 2000 };

    let kpi = storage
        .campaign_kpi_clicks(f.campaign_id, today, range)
        .await
        .unwrap();
    assert_eq!(kpi.today_clicks, 2);
    assert_eq!(kpi.range_clicks, 4);
    assert_eq!(kpi.total_clicks, 6);

    let combos = storage
        .combination_stats(f.campaign_id, today, range)
        .await
        .unwrap();
    assert_eq!(combos.len(), 2);
    assert_eq!(combos[0].channel_id, f.channel_id);
    assert_eq!(combos[0].range_clicks, 3);
    assert_eq!(combos[1].channel_id, blog.id);
    assert_eq!(combos[1].range_clicks, 1);

    let ranking = storage.channel_ranking(f.campaign_id, range, 1).await.unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].channel_id, f.channel_id);
    assert_eq!(ranking[0].clicks, 3);

    // Clicks on an inactive link drop out of campaign-scoped numbers
    storage.deactivate_link(yt.id).await.unwrap();
    let kpi = storage
        .campaign_kpi_clicks(f.campaign_id, today, range)
        .await
        .unwrap();
    assert_eq!(kpi.total_clicks, 2);
    assert_eq!(storage.today_clicks(f.advertiser_id, today).await.unwrap(), 0);

    // Advertiser rollups still count every link of active campaigns
    let campaigns = storage.campaign_stats(f.advertiser_id, today).await.unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].total_clicks, 6);
    assert_eq!(campaigns[0].today_clicks, 2);
}

#[tokio::test]
async fn test_zero_click_rows_are_listed() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "zero@example.com").await;
    storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "quietlnk"))
        .await
        .unwrap();
    let empty = storage
        .create_campaign(f.advertiser_id, &campaign_fields("Empty"))
        .await
        .unwrap();

    let combos = storage
        .combination_stats(f.campaign_id, WINDOW_ALL, WINDOW_ALL)
        .await
        .unwrap();
    assert_eq!(combos.len(), 1);
    assert_eq!(combos[0].total_clicks, 0);

    let campaigns = storage
        .campaign_stats(f.advertiser_id, WINDOW_ALL)
        .await
        .unwrap();
    assert_eq!(campaigns.len(), 2);
    assert!(campaigns.iter().any(|c| c.campaign_id == empty.id && c.total_clicks == 0));

    let creators = storage.creator_stats(f.advertiser_id, WINDOW_ALL).await.unwrap();
    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0].creator_name, "alice");
}

#[tokio::test]
async fn test_reset_wipes_everything() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "reset@example.com").await;
    let link = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "resetme1"))
        .await
        .unwrap();
    storage
        .record_clicks(&[click(link.id, 10), click(link.id, 20)])
        .await
        .unwrap();

    let counts = storage.reset().await.unwrap();
    assert_eq!(counts.clicks, 2);
    assert_eq!(counts.tracking_links, 1);
    assert_eq!(counts.campaigns, 1);
    assert_eq!(counts.channels, 1);
    assert_eq!(counts.creators, 1);
    assert_eq!(counts.advertisers, 1);

    assert!(storage.get_campaign(f.campaign_id).await.unwrap().is_none());
    let again = storage
        .create_advertiser("reset@example.com", "Again", "hash")
        .await
        .unwrap();
    assert_eq!(again.id, 1);
}

#[tokio::test]
async fn test_cached_storage_buffers_clicks_until_read() {
    let inner = create_test_storage().await;
    let f = fixture(&inner, "cache@example.com").await;
    let cached = Arc::new(CachedStorage::new(Arc::clone(&inner), 100, 60, 3600));
    let storage: Arc<dyn Storage> = cached.clone();
    // Let the flush task consume its immediate first tick
    tokio::task::yield_now().await;

    let link = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "buffered"))
        .await
        .unwrap();

    storage
        .record_clicks(&[click(link.id, 10), click(link.id, 20), click(link.id, 30)])
        .await
        .unwrap();
    assert_eq!(cached.pending_clicks(), 3);

    // The backing store has not seen them yet
    let raw = inner
        .campaign_kpi_clicks(f.campaign_id, WINDOW_ALL, WINDOW_ALL)
        .await
        .unwrap();
    assert_eq!(raw.total_clicks, 0);

    // Reads through the wrapper flush first
    let kpi = storage
        .campaign_kpi_clicks(f.campaign_id, WINDOW_ALL, WINDOW_ALL)
        .await
        .unwrap();
    assert_eq!(kpi.total_clicks, 3);
    assert_eq!(cached.pending_clicks(), 0);
}

#[tokio::test]
async fn test_cached_slug_lookup_sees_deactivation() {
    let inner = create_test_storage().await;
    let f = fixture(&inner, "slugcache@example.com").await;
    let storage: Arc<dyn Storage> = Arc::new(CachedStorage::new(Arc::clone(&inner), 100, 60, 3600));

    // Cache a miss first, then mint under that slug
    assert!(storage.get_link_by_slug("cachedlk").await.unwrap().is_none());
    let link = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "cachedlk"))
        .await
        .unwrap();
    let hit = storage.get_link_by_slug("cachedlk").await.unwrap().unwrap();
    assert_eq!(hit.id, link.id);

    storage.deactivate_link(link.id).await.unwrap();
    let after = storage.get_link_by_slug("cachedlk").await.unwrap().unwrap();
    assert_eq!(after.status, Status::Inactive);

    // Cascades drop the whole cache
    let second = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, "cachedl2"))
        .await
        .unwrap();
    storage.get_link_by_slug(&second.slug).await.unwrap();
    storage.deactivate_channel(f.channel_id).await.unwrap();
    let cascaded = storage.get_link_by_slug("cachedl2").await.unwrap().unwrap();
    assert_eq!(cascaded.status, Status::Inactive);
}

#[tokio::test]
async fn test_active_slugs_oldest_first() {
    let storage = create_test_storage().await;
    let f = fixture(&storage, "slugs@example.com").await;
    let bob = storage
        .create_creator(f.advertiser_id, &creator_fields("bob"))
        .await
        .unwrap();
    let carol = storage
        .create_creator(f.advertiser_id, &creator_fields("carol"))
        .await
        .unwrap();

    for (creator_id, slug) in [(f.creator_id, "first001"), (bob.id, "second02"), (carol.id, "third003")] {
        storage
            .create_link(&new_link(f.campaign_id, creator_id, f.channel_id, slug))
            .await
            .unwrap();
    }

    assert_eq!(
        storage.list_active_slugs(2).await.unwrap(),
        vec!["first001".to_string(), "second02".to_string()]
    );
}

#[tokio::test]
async fn test_postgres_active_link_rules() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };

    // The database may be shared, so every run uses fresh identities
    let run = generate_slug();
    let f = fixture(&storage, &format!("pg-{run}@example.com")).await;
    let (first_slug, second_slug) = (generate_slug(), generate_slug());

    let first = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, &first_slug))
        .await
        .unwrap();
    let duplicate = storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, &second_slug))
        .await;
    assert!(matches!(duplicate, Err(StorageError::Conflict(_))));

    storage.record_clicks(&[click(first.id, 1_000), click(first.id, 2_000)]).await.unwrap();
    let kpi = storage
        .campaign_kpi_clicks(f.campaign_id, WINDOW_ALL, WINDOW_ALL)
        .await
        .unwrap();
    assert_eq!(kpi.total_clicks, 2);

    storage.deactivate_link(first.id).await.unwrap();
    storage
        .create_link(&new_link(f.campaign_id, f.creator_id, f.channel_id, &second_slug))
        .await
        .unwrap();
    assert_eq!(storage.count_active_links(f.campaign_id).await.unwrap(), 1);
}
