use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account owner; every campaign, creator and channel is scoped to one
#[derive(Debug, Clone, FromRow)]
pub struct Advertiser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<Advertiser> for AdvertiserResponse {
    fn from(advertiser: Advertiser) -> Self {
        Self {
            id: advertiser.id,
            email: advertiser.email,
            name: advertiser.name,
        }
    }
}
