use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Status;

#[derive(Debug, Clone, FromRow)]
pub struct TrackingLink {
    pub id: i64,
    pub campaign_id: i64,
    pub creator_id: i64,
    pub channel_id: i64,
    pub slug: String,
    pub final_url: String,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: i64,
}

impl TrackingLink {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Link joined with the creator and channel it attributes to
#[derive(Debug, Clone, FromRow)]
pub struct TrackingLinkView {
    pub id: i64,
    pub campaign_id: i64,
    pub creator_id: i64,
    pub channel_id: i64,
    pub slug: String,
    pub final_url: String,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: i64,
    pub creator_name: String,
    pub channel_display: String,
    pub channel_icon_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrackingLink {
    pub campaign_id: i64,
    pub creator_id: i64,
    pub channel_id: i64,
    pub slug: String,
    pub final_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrackingLinkRequest {
    pub campaign_id: i64,
    pub creator_id: i64,
    pub channel_id: i64,
    /// Scopes the request to one advertiser when present
    pub advertiser_id: Option<i64>,
    /// Overrides the campaign landing URL
    pub final_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLinkResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub creator_id: i64,
    pub channel_id: i64,
    pub creator_name: Option<String>,
    pub channel_display: Option<String>,
    pub channel_icon_url: Option<String>,
    pub slug: String,
    pub final_url: String,
    pub tracking_url: String,
    pub status: Status,
}

/// Public URL a tracking slug is served under
pub fn tracking_url(base_url: &str, slug: &str) -> String {
    format!("{}/t/{}", base_url.trim_end_matches('/'), slug)
}

impl TrackingLinkResponse {
    pub fn from_link(link: TrackingLink, base_url: &str) -> Self {
        Self {
            tracking_url: tracking_url(base_url, &link.slug),
            id: link.id,
            campaign_id: link.campaign_id,
            creator_id: link.creator_id,
            channel_id: link.channel_id,
            creator_name: None,
            channel_display: None,
            channel_icon_url: None,
            slug: link.slug,
            final_url: link.final_url,
            status: link.status,
        }
    }

    pub fn from_view(view: TrackingLinkView, base_url: &str) -> Self {
        Self {
            tracking_url: tracking_url(base_url, &view.slug),
            id: view.id,
            campaign_id: view.campaign_id,
            creator_id: view.creator_id,
            channel_id: view.channel_id,
            creator_name: Some(view.creator_name),
            channel_display: Some(view.channel_display),
            channel_icon_url: view.channel_icon_url,
            slug: view.slug,
            final_url: view.final_url,
            status: view.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tracking_url;

    #[test]
    fn tracking_url_joins_without_double_slash() {
        assert_eq!(
            tracking_url("http://localhost:3000/", "aB3dE6gH"),
            "http://localhost:3000/t/aB3dE6gH"
        );
        assert_eq!(
            tracking_url("https://go.example.com", "x"),
            "https://go.example.com/t/x"
        );
    }
}
