use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Status;

#[derive(Debug, Clone, FromRow)]
pub struct Creator {
    pub id: i64,
    pub advertiser_id: i64,
    pub name: String,
    pub channel_name: String,
    pub channel_url: String,
    pub note: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Creator {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

#[derive(Debug, Clone)]
pub struct CreatorFields {
    pub name: String,
    pub channel_name: String,
    pub channel_url: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCreatorRequest {
    pub advertiser_id: i64,
    pub name: String,
    pub channel_name: String,
    pub channel_url: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCreatorRequest {
    pub advertiser_id: i64,
    pub name: String,
    pub channel_name: String,
    pub channel_url: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorResponse {
    pub id: i64,
    pub advertiser_id: i64,
    pub name: String,
    pub channel_name: String,
    pub channel_url: String,
    pub note: Option<String>,
}

impl From<Creator> for CreatorResponse {
    fn from(creator: Creator) -> Self {
        Self {
            id: creator.id,
            advertiser_id: creator.advertiser_id,
            name: creator.name,
            channel_name: creator.channel_name,
            channel_url: creator.channel_url,
            note: creator.note,
        }
    }
}
