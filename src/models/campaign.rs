use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Status;
use crate::lifecycle::{campaign_state, CampaignState};

#[derive(Debug, Clone, FromRow)]
pub struct Campaign {
    pub id: i64,
    pub advertiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub landing_url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn state_on(&self, today: NaiveDate) -> CampaignState {
        campaign_state(self.start_date, self.end_date, today)
    }
}

/// Editable campaign columns, shared by create and update
#[derive(Debug, Clone)]
pub struct CampaignFields {
    pub name: String,
    pub description: Option<String>,
    pub landing_url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub advertiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub landing_url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub advertiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub landing_url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub id: i64,
    pub advertiser_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub landing_url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: CampaignState,
}

impl CampaignResponse {
    pub fn from_campaign(campaign: Campaign, today: NaiveDate) -> Self {
        let state = campaign.state_on(today);
        Self {
            id: campaign.id,
            advertiser_id: campaign.advertiser_id,
            name: campaign.name,
            description: campaign.description,
            landing_url: campaign.landing_url,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            state,
        }
    }
}
