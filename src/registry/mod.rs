//! Tracking link registry
//!
//! Mints one slug per (campaign, creator, channel) triple, resolves slugs for
//! the redirect path and soft-deletes links. A deactivated slug is never reused.

pub mod slug;

use crate::models::{
    is_http_url, non_blank, CreateTrackingLinkRequest, NewTrackingLink, TrackingLink,
    TrackingLinkView,
};
use crate::storage::{Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;

pub use slug::{generate_slug, is_valid_slug, SLUG_LEN};

/// Slug collisions tolerated before minting gives up
pub const MAX_SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("campaign, creator and channel must belong to the same advertiser")]
    OwnerMismatch,
    #[error("final URL must be an absolute http(s) URL")]
    InvalidUrl,
    #[error("{0}")]
    Conflict(String),
    #[error("could not allocate a unique slug after {0} attempts")]
    SlugExhausted(usize),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct LinkRegistry {
    storage: Arc<dyn Storage>,
    slug_source: fn() -> String,
}

impl LinkRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_slug_source(storage, generate_slug)
    }

    /// Registry drawing slugs from a custom generator
    pub fn with_slug_source(storage: Arc<dyn Storage>, slug_source: fn() -> String) -> Self {
        Self {
            storage,
            slug_source,
        }
    }

    /// Mints an active link for the requested triple.
    ///
    /// Inactive or foreign resources are reported as missing. The final URL
    /// falls back to the campaign landing URL when the request leaves it blank.
    pub async fn mint(&self, request: &CreateTrackingLinkRequest) -> Result<TrackingLink, RegistryError> {
        let campaign = self
            .storage
            .get_campaign(request.campaign_id)
            .await?
            .filter(|c| c.is_active())
            .ok_or(RegistryError::NotFound("campaign"))?;
        let creator = self
            .storage
            .get_creator(request.creator_id)
            .await?
            .filter(|c| c.is_active())
            .ok_or(RegistryError::NotFound("creator"))?;
        let channel = self
            .storage
            .get_channel(request.channel_id)
            .await?
            .filter(|c| c.is_active())
            .ok_or(RegistryError::NotFound("channel"))?;

        if let Some(advertiser_id) = request.advertiser_id {
            if campaign.advertiser_id != advertiser_id {
                return Err(RegistryError::NotFound("campaign"));
            }
            if creator.advertiser_id != advertiser_id {
                return Err(RegistryError::NotFound("creator"));
            }
            if channel.advertiser_id != advertiser_id {
                return Err(RegistryError::NotFound("channel"));
            }
        }

        if creator.advertiser_id != campaign.advertiser_id
            || channel.advertiser_id != campaign.advertiser_id
        {
            return Err(RegistryError::OwnerMismatch);
        }

        let final_url = non_blank(request.final_url.clone())
            .map(|url| url.trim().to_string())
            .unwrap_or(campaign.landing_url);
        if !is_http_url(&final_url) {
            return Err(RegistryError::InvalidUrl);
        }

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let link = NewTrackingLink {
                campaign_id: campaign.id,
                creator_id: creator.id,
                channel_id: channel.id,
                slug: (self.slug_source)(),
                final_url: final_url.clone(),
            };

            match self.storage.create_link(&link).await {
                Ok(created) => {
                    tracing::info!(
                        slug = %created.slug,
                        campaign_id = created.campaign_id,
                        creator_id = created.creator_id,
                        channel_id = created.channel_id,
                        "Minted tracking link"
                    );
                    return Ok(created);
                }
                Err(StorageError::SlugTaken) => {
                    tracing::warn!(attempt, slug = %link.slug, "Slug collision, retrying");
                }
                Err(StorageError::Conflict(message)) => return Err(RegistryError::Conflict(message)),
                Err(StorageError::Other(e)) => return Err(RegistryError::Storage(e)),
            }
        }

        Err(RegistryError::SlugExhausted(MAX_SLUG_ATTEMPTS))
    }

    /// Looks a slug up regardless of status
    pub async fn resolve(&self, slug: &str) -> anyhow::Result<Option<TrackingLink>> {
        self.storage.get_link_by_slug(slug).await
    }

    /// Active links of a campaign with creator and channel details
    pub async fn list(
        &self,
        campaign_id: i64,
        advertiser_id: Option<i64>,
    ) -> Result<Vec<TrackingLinkView>, RegistryError> {
        let campaign = self
            .storage
            .get_campaign(campaign_id)
            .await?
            .filter(|c| c.is_active())
            .filter(|c| advertiser_id.is_none_or(|id| c.advertiser_id == id))
            .ok_or(RegistryError::NotFound("campaign"))?;

        Ok(self.storage.list_links(campaign.id).await?)
    }

    /// Soft-deletes a link. Deactivating an inactive link is a no-op.
    pub async fn deactivate(&self, id: i64, advertiser_id: Option<i64>) -> Result<(), RegistryError> {
        let link = self
            .storage
            .get_link(id)
            .await?
            .ok_or(RegistryError::NotFound("tracking link"))?;

        if let Some(advertiser_id) = advertiser_id {
            let owner = self
                .storage
                .get_campaign(link.campaign_id)
                .await?
                .map(|c| c.advertiser_id);
            if owner != Some(advertiser_id) {
                return Err(RegistryError::NotFound("tracking link"));
            }
        }

        if let Some(slug) = self.storage.deactivate_link(id).await? {
            tracing::info!(slug = %slug, link_id = id, "Deactivated tracking link");
        }

        Ok(())
    }
}
