use crate::models::{
    unix_now, Advertiser, Campaign, CampaignFields, CampaignStat, Channel, ChannelFields,
    ChannelRanking, CombinationStat, Creator, CreatorFields, CreatorStat, KpiClicks, NewClick,
    NewTrackingLink, TimeWindow, TrackingLink, TrackingLinkView,
};
use crate::storage::{
    is_unique_violation, ResetCounts, Storage, StorageError, StorageResult, CLICK_INSERT_BATCH,
};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        // Every connection to an in-memory database sees its own empty database,
        // so those pools hold exactly one connection that is never recycled.
        let in_memory = database_url.contains(":memory:");
        let mut options = SqlitePoolOptions::new();
        options = if in_memory {
            options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(max_connections)
        };

        let pool = options.connect(database_url).await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS advertisers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                advertiser_id INTEGER NOT NULL REFERENCES advertisers(id),
                name TEXT NOT NULL,
                description TEXT,
                landing_url TEXT NOT NULL,
                start_date TEXT,
                end_date TEXT,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_campaigns_advertiser ON campaigns(advertiser_id, status)",
            r#"
            CREATE TABLE IF NOT EXISTS creators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                advertiser_id INTEGER NOT NULL REFERENCES advertisers(id),
                name TEXT NOT NULL,
                channel_name TEXT NOT NULL,
                channel_url TEXT NOT NULL,
                note TEXT,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_creators_advertiser ON creators(advertiser_id, status)",
            r#"
            CREATE TABLE IF NOT EXISTS channels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                advertiser_id INTEGER NOT NULL REFERENCES advertisers(id),
                platform TEXT NOT NULL,
                placement TEXT NOT NULL,
                display_name TEXT NOT NULL,
                icon_url TEXT,
                note TEXT,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS ux_channels_active_key
            ON channels(advertiser_id, platform, placement)
            WHERE status = 'ACTIVE'
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tracking_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
                creator_id INTEGER NOT NULL REFERENCES creators(id),
                channel_id INTEGER NOT NULL REFERENCES channels(id),
                slug TEXT NOT NULL UNIQUE,
                final_url TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                created_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS ux_links_active_triple
            ON tracking_links(campaign_id, creator_id, channel_id)
            WHERE status = 'ACTIVE'
            "#,
            "CREATE INDEX IF NOT EXISTS idx_links_creator ON tracking_links(creator_id)",
            "CREATE INDEX IF NOT EXISTS idx_links_channel ON tracking_links(channel_id)",
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tracking_link_id INTEGER NOT NULL REFERENCES tracking_links(id),
                clicked_at INTEGER NOT NULL,
                ip TEXT,
                user_agent TEXT,
                referer TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_clicks_link_time ON clicks(tracking_link_id, clicked_at)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(self.pool.as_ref()).await?;
        }

        Ok(())
    }

    async fn create_advertiser(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> StorageResult<Advertiser> {
        let advertiser = sqlx::query_as::<_, Advertiser>(
            r#"
            INSERT INTO advertisers (email, name, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            RETURNING id, email, name, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(unix_now())
        .fetch_optional(self.pool.as_ref())
        .await?;

        advertiser.ok_or_else(|| StorageError::Conflict("email is already registered".to_string()))
    }

    async fn get_advertiser(&self, id: i64) -> Result<Option<Advertiser>> {
        let advertiser = sqlx::query_as::<_, Advertiser>(
            "SELECT id, email, name, password_hash, created_at FROM advertisers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(advertiser)
    }

    async fn get_advertiser_by_email(&self, email: &str) -> Result<Option<Advertiser>> {
        let advertiser = sqlx::query_as::<_, Advertiser>(
            "SELECT id, email, name, password_hash, created_at FROM advertisers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(advertiser)
    }

    async fn create_campaign(&self, advertiser_id: i64, fields: &CampaignFields) -> Result<Campaign> {
        let now = unix_now();
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns
                (advertiser_id, name, description, landing_url, start_date, end_date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'ACTIVE', ?, ?)
            RETURNING id, advertiser_id, name, description, landing_url, start_date, end_date,
                      status, created_at, updated_at
            "#,
        )
        .bind(advertiser_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.landing_url)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(campaign)
    }

    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, advertiser_id, name, description, landing_url, start_date, end_date,
                   status, created_at, updated_at
            FROM campaigns
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(campaign)
    }

    async fn list_campaigns(&self, advertiser_id: i64) -> Result<Vec<Campaign>> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, advertiser_id, name, description, landing_url, start_date, end_date,
                   status, created_at, updated_at
            FROM campaigns
            WHERE advertiser_id = ? AND status = 'ACTIVE'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(advertiser_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(campaigns)
    }

    async fn update_campaign(&self, id: i64, fields: &CampaignFields) -> Result<Option<Campaign>> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns
            SET name = ?, description = ?, landing_url = ?, start_date = ?, end_date = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, advertiser_id, name, description, landing_url, start_date, end_date,
                      status, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.landing_url)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(unix_now())
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(campaign)
    }

    async fn deactivate_campaign(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET status = 'INACTIVE', updated_at = ?
            WHERE id = ? AND status = 'ACTIVE'
              AND NOT EXISTS (
                  SELECT 1 FROM tracking_links WHERE campaign_id = ? AND status = 'ACTIVE'
              )
            "#,
        )
        .bind(unix_now())
        .bind(id)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_creator(&self, advertiser_id: i64, fields: &CreatorFields) -> Result<Creator> {
        let now = unix_now();
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            INSERT INTO creators
                (advertiser_id, name, channel_name, channel_url, note, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'ACTIVE', ?, ?)
            RETURNING id, advertiser_id, name, channel_name, channel_url, note, status, created_at, updated_at
            "#,
        )
        .bind(advertiser_id)
        .bind(&fields.name)
        .bind(&fields.channel_name)
        .bind(&fields.channel_url)
        .bind(&fields.note)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(creator)
    }

    async fn get_creator(&self, id: i64) -> Result<Option<Creator>> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            SELECT id, advertiser_id, name, channel_name, channel_url, note, status, created_at, updated_at
            FROM creators
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(creator)
    }

    async fn list_creators(&self, advertiser_id: i64) -> Result<Vec<Creator>> {
        let creators = sqlx::query_as::<_, Creator>(
            r#"
            SELECT id, advertiser_id, name, channel_name, channel_url, note, status, created_at, updated_at
            FROM creators
            WHERE advertiser_id = ? AND status = 'ACTIVE'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(advertiser_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(creators)
    }

    async fn update_creator(&self, id: i64, fields: &CreatorFields) -> Result<Option<Creator>> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            UPDATE creators
            SET name = ?, channel_name = ?, channel_url = ?, note = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, advertiser_id, name, channel_name, channel_url, note, status, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.channel_name)
        .bind(&fields.channel_url)
        .bind(&fields.note)
        .bind(unix_now())
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(creator)
    }

    async fn deactivate_creator(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE creators SET status = 'INACTIVE', updated_at = ? WHERE id = ? AND status = 'ACTIVE'",
        )
        .bind(unix_now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE tracking_links SET status = 'INACTIVE' WHERE creator_id = ? AND status = 'ACTIVE'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn create_channel(&self, advertiser_id: i64, fields: &ChannelFields) -> StorageResult<Channel> {
        let now = unix_now();
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            INSERT INTO channels
                (advertiser_id, platform, placement, display_name, icon_url, note, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'ACTIVE', ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id, advertiser_id, platform, placement, display_name, icon_url, note,
                      status, created_at, updated_at
            "#,
        )
        .bind(advertiser_id)
        .bind(&fields.platform)
        .bind(&fields.placement)
        .bind(&fields.display_name)
        .bind(&fields.icon_url)
        .bind(&fields.note)
        .bind(now)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        channel.ok_or_else(|| StorageError::Conflict("channel already exists".to_string()))
    }

    async fn find_channel_by_key(
        &self,
        advertiser_id: i64,
        platform: &str,
        placement: &str,
    ) -> Result<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            SELECT id, advertiser_id, platform, placement, display_name, icon_url, note,
                   status, created_at, updated_at
            FROM channels
            WHERE advertiser_id = ? AND platform = ? AND placement = ?
            ORDER BY CASE status WHEN 'ACTIVE' THEN 0 ELSE 1 END, updated_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(advertiser_id)
        .bind(platform)
        .bind(placement)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(channel)
    }

    async fn get_channel(&self, id: i64) -> Result<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            SELECT id, advertiser_id, platform, placement, display_name, icon_url, note,
                   status, created_at, updated_at
            FROM channels
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(channel)
    }

    async fn list_channels(&self, advertiser_id: i64) -> Result<Vec<Channel>> {
        let channels = sqlx::query_as::<_, Channel>(
            r#"
            SELECT id, advertiser_id, platform, placement, display_name, icon_url, note,
                   status, created_at, updated_at
            FROM channels
            WHERE advertiser_id = ? AND status = 'ACTIVE'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(advertiser_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(channels)
    }

    async fn update_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>> {
        let result = sqlx::query_as::<_, Channel>(
            r#"
            UPDATE channels
            SET platform = ?, placement = ?, display_name = ?, icon_url = ?, note = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, advertiser_id, platform, placement, display_name, icon_url, note,
                      status, created_at, updated_at
            "#,
        )
        .bind(&fields.platform)
        .bind(&fields.placement)
        .bind(&fields.display_name)
        .bind(&fields.icon_url)
        .bind(&fields.note)
        .bind(unix_now())
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await;

        match result {
            Ok(channel) => Ok(channel),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Conflict("channel already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn restore_channel(&self, id: i64, fields: &ChannelFields) -> StorageResult<Option<Channel>> {
        let result = sqlx::query_as::<_, Channel>(
            r#"
            UPDATE channels
            SET platform = ?, placement = ?, display_name = ?, icon_url = ?, note = ?,
                status = 'ACTIVE', updated_at = ?
            WHERE id = ? AND status = 'INACTIVE'
            RETURNING id, advertiser_id, platform, placement, display_name, icon_url, note,
                      status, created_at, updated_at
            "#,
        )
        .bind(&fields.platform)
        .bind(&fields.placement)
        .bind(&fields.display_name)
        .bind(&fields.icon_url)
        .bind(&fields.note)
        .bind(unix_now())
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await;

        match result {
            Ok(channel) => Ok(channel),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Conflict("channel already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn deactivate_channel(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE channels SET status = 'INACTIVE', updated_at = ? WHERE id = ? AND status = 'ACTIVE'",
        )
        .bind(unix_now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE tracking_links SET status = 'INACTIVE' WHERE channel_id = ? AND status = 'ACTIVE'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn create_link(&self, link: &NewTrackingLink) -> StorageResult<TrackingLink> {
        let created = sqlx::query_as::<_, TrackingLink>(
            r#"
            INSERT INTO tracking_links (campaign_id, creator_id, channel_id, slug, final_url, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'ACTIVE', ?)
            ON CONFLICT DO NOTHING
            RETURNING id, campaign_id, creator_id, channel_id, slug, final_url, status, created_at
            "#,
        )
        .bind(link.campaign_id)
        .bind(link.creator_id)
        .bind(link.channel_id)
        .bind(&link.slug)
        .bind(&link.final_url)
        .bind(unix_now())
        .fetch_optional(self.pool.as_ref())
        .await?;

        if let Some(created) = created {
            return Ok(created);
        }

        // Nothing inserted: either the triple already has an active link or the slug is taken
        let active_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tracking_links
            WHERE campaign_id = ? AND creator_id = ? AND channel_id = ? AND status = 'ACTIVE'
            "#,
        )
        .bind(link.campaign_id)
        .bind(link.creator_id)
        .bind(link.channel_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        if active_exists > 0 {
            Err(StorageError::Conflict(
                "an active tracking link already exists for this campaign, creator and channel"
                    .to_string(),
            ))
        } else {
            Err(StorageError::SlugTaken)
        }
    }

    async fn get_link(&self, id: i64) -> Result<Option<TrackingLink>> {
        let link = sqlx::query_as::<_, TrackingLink>(
            r#"
            SELECT id, campaign_id, creator_id, channel_id, slug, final_url, status, created_at
            FROM tracking_links
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn get_link_by_slug(&self, slug: &str) -> Result<Option<TrackingLink>> {
        let link = sqlx::query_as::<_, TrackingLink>(
            r#"
            SELECT id, campaign_id, creator_id, channel_id, slug, final_url, status, created_at
            FROM tracking_links
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn list_links(&self, campaign_id: i64) -> Result<Vec<TrackingLinkView>> {
        let links = sqlx::query_as::<_, TrackingLinkView>(
            r#"
            SELECT tl.id, tl.campaign_id, tl.creator_id, tl.channel_id, tl.slug, tl.final_url,
                   tl.status, tl.created_at,
                   cr.name AS creator_name,
                   ch.display_name AS channel_display,
                   ch.icon_url AS channel_icon_url
            FROM tracking_links tl
            JOIN creators cr ON cr.id = tl.creator_id
            JOIN channels ch ON ch.id = tl.channel_id
            WHERE tl.campaign_id = ? AND tl.status = 'ACTIVE'
            ORDER BY tl.created_at DESC, tl.id DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn count_active_links(&self, campaign_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tracking_links WHERE campaign_id = ? AND status = 'ACTIVE'",
        )
        .bind(campaign_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn deactivate_link(&self, id: i64) -> Result<Option<String>> {
        let slug = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE tracking_links
            SET status = 'INACTIVE'
            WHERE id = ? AND status = 'ACTIVE'
            RETURNING slug
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(slug)
    }

    async fn list_active_slugs(&self, limit: i64) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM tracking_links WHERE status = 'ACTIVE' ORDER BY id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(slugs)
    }

    async fn record_clicks(&self, clicks: &[NewClick]) -> Result<()> {
        if clicks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in clicks.chunks(CLICK_INSERT_BATCH) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO clicks (tracking_link_id, clicked_at, ip, user_agent, referer) ",
            );
            builder.push_values(chunk, |mut row, click| {
                row.push_bind(click.tracking_link_id)
                    .push_bind(click.clicked_at)
                    .push_bind(click.ip.clone())
                    .push_bind(click.user_agent.clone())
                    .push_bind(click.referer.clone());
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn campaign_kpi_clicks(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<KpiClicks> {
        let clicks = sqlx::query_as::<_, KpiClicks>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS today_clicks,
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS range_clicks,
                COUNT(cl.id) AS total_clicks
            FROM clicks cl
            JOIN tracking_links tl ON tl.id = cl.tracking_link_id
            WHERE tl.campaign_id = ? AND tl.status = 'ACTIVE'
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .bind(range.start)
        .bind(range.end)
        .bind(campaign_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(clicks)
    }

    async fn combination_stats(
        &self,
        campaign_id: i64,
        today: TimeWindow,
        range: TimeWindow,
    ) -> Result<Vec<CombinationStat>> {
        let rows = sqlx::query_as::<_, CombinationStat>(
            r#"
            SELECT
                cr.id AS creator_id,
                cr.name AS creator_name,
                ch.id AS channel_id,
                ch.display_name AS channel_display_name,
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS today_clicks,
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS range_clicks,
                COUNT(cl.id) AS total_clicks
            FROM tracking_links tl
            JOIN creators cr ON cr.id = tl.creator_id
            JOIN channels ch ON ch.id = tl.channel_id
            LEFT JOIN clicks cl ON cl.tracking_link_id = tl.id
            WHERE tl.campaign_id = ? AND tl.status = 'ACTIVE'
            GROUP BY cr.id, cr.name, ch.id, ch.display_name
            ORDER BY today_clicks DESC, range_clicks DESC, cr.id ASC, ch.id ASC
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .bind(range.start)
        .bind(range.end)
        .bind(campaign_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn channel_ranking(
        &self,
        campaign_id: i64,
        range: TimeWindow,
        limit: i64,
    ) -> Result<Vec<ChannelRanking>> {
        let rows = sqlx::query_as::<_, ChannelRanking>(
            r#"
            SELECT ch.id AS channel_id, ch.display_name AS channel_display_name, COUNT(cl.id) AS clicks
            FROM clicks cl
            JOIN tracking_links tl ON tl.id = cl.tracking_link_id
            JOIN channels ch ON ch.id = tl.channel_id
            WHERE tl.campaign_id = ? AND tl.status = 'ACTIVE'
              AND cl.clicked_at >= ? AND cl.clicked_at < ?
            GROUP BY ch.id, ch.display_name
            ORDER BY clicks DESC, ch.id ASC
            LIMIT ?
            "#,
        )
        .bind(campaign_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn campaign_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CampaignStat>> {
        let rows = sqlx::query_as::<_, CampaignStat>(
            r#"
            SELECT
                c.id AS campaign_id,
                c.name AS campaign_name,
                COUNT(cl.id) AS total_clicks,
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS today_clicks
            FROM campaigns c
            LEFT JOIN tracking_links tl ON tl.campaign_id = c.id
            LEFT JOIN clicks cl ON cl.tracking_link_id = tl.id
            WHERE c.advertiser_id = ? AND c.status = 'ACTIVE'
            GROUP BY c.id, c.name
            ORDER BY total_clicks DESC, c.id ASC
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .bind(advertiser_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn creator_stats(&self, advertiser_id: i64, today: TimeWindow) -> Result<Vec<CreatorStat>> {
        let rows = sqlx::query_as::<_, CreatorStat>(
            r#"
            SELECT
                c.id AS creator_id,
                c.name AS creator_name,
                COUNT(cl.id) AS total_clicks,
                COALESCE(SUM(CASE WHEN cl.clicked_at >= ? AND cl.clicked_at < ? THEN 1 ELSE 0 END), 0) AS today_clicks
            FROM creators c
            LEFT JOIN tracking_links tl ON tl.creator_id = c.id
            LEFT JOIN clicks cl ON cl.tracking_link_id = tl.id
            WHERE c.advertiser_id = ? AND c.status = 'ACTIVE'
            GROUP BY c.id, c.name
            ORDER BY total_clicks DESC, c.id ASC
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .bind(advertiser_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn today_clicks(&self, advertiser_id: i64, today: TimeWindow) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(cl.id)
            FROM clicks cl
            JOIN tracking_links tl ON tl.id = cl.tracking_link_id
            JOIN campaigns c ON c.id = tl.campaign_id
            WHERE c.advertiser_id = ?
              AND c.status = 'ACTIVE'
              AND tl.status = 'ACTIVE'
              AND cl.clicked_at >= ? AND cl.clicked_at < ?
            "#,
        )
        .bind(advertiser_id)
        .bind(today.start)
        .bind(today.end)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn reset(&self) -> Result<ResetCounts> {
        let mut tx = self.pool.begin().await?;

        // Children first so foreign keys stay satisfied
        let clicks = sqlx::query("DELETE FROM clicks").execute(&mut *tx).await?;
        let links = sqlx::query("DELETE FROM tracking_links").execute(&mut *tx).await?;
        let campaigns = sqlx::query("DELETE FROM campaigns").execute(&mut *tx).await?;
        let channels = sqlx::query("DELETE FROM channels").execute(&mut *tx).await?;
        let creators = sqlx::query("DELETE FROM creators").execute(&mut *tx).await?;
        let advertisers = sqlx::query("DELETE FROM advertisers").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sqlite_sequence").execute(&mut *tx).await?;

        tx.commit().await?;

        Ok(ResetCounts {
            clicks: clicks.rows_affected(),
            tracking_links: links.rows_affected(),
            campaigns: campaigns.rows_affected(),
            channels: channels.rows_affected(),
            creators: creators.rows_affected(),
            advertisers: advertisers.rows_affected(),
        })
    }
}
